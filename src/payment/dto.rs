use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CardDetails, PaymentMethod};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub purchase_id: Uuid,
    pub course_id: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeReceipt {
    pub transaction_id: String,
    pub amount: f64,
    pub charged_at: String,
}

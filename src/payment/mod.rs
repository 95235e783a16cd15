pub mod dto;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::PaymentMethod;
use crate::validation::ValidationErrors;

pub use dto::{ChargeReceipt, ChargeRequest};

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),

    #[error("payment gateway unreachable: {0}")]
    Network(String),

    #[error("invalid payment details: {0}")]
    Validation(ValidationErrors),

    #[error("course no longer available: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError>;
}

/// Gateway stand-in: waits a fixed latency and approves every charge except
/// those on its decline list.
pub struct SimulatedGateway {
    latency: Duration,
    declined_cards: Vec<String>,
}

impl SimulatedGateway {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            declined_cards: Vec::new(),
        }
    }

    pub fn decline_card(mut self, card_number: &str) -> Self {
        self.declined_cards.push(digits(card_number));
        self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        tokio::time::sleep(self.latency).await;

        if request.payment_method == PaymentMethod::CreditCard {
            let number = request
                .card
                .as_ref()
                .map(|c| digits(&c.card_number))
                .unwrap_or_default();
            if self.declined_cards.contains(&number) {
                warn!("Simulated decline for purchase {}", request.purchase_id);
                return Err(PaymentError::Declined("card declined by issuer".to_string()));
            }
        }

        Ok(ChargeReceipt {
            transaction_id: Uuid::new_v4().to_string(),
            amount: request.amount,
            charged_at: Utc::now().to_rfc3339(),
        })
    }
}

pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        let url = format!("{}/charges", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Declined(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Network(format!("gateway error {}: {}", status, body)));
        }

        let receipt = response
            .json::<ChargeReceipt>()
            .await
            .map_err(|e| PaymentError::Network(format!("Failed to parse gateway response: {}", e)))?;
        info!("Gateway accepted charge {}", receipt.transaction_id);
        Ok(receipt)
    }
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Groups up to 16 digits in blocks of four: `"4242424242424242"` becomes
/// `"4242 4242 4242 4242"`. Fewer than four digits are returned as-is.
pub fn format_card_number(value: &str) -> String {
    let digits = digits(value);
    if digits.len() < 4 {
        return digits;
    }
    digits
        .as_bytes()
        .chunks(4)
        .take(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `MM/YY` from whatever digits were typed.
pub fn format_expiry_date(value: &str) -> String {
    let digits = digits(value);
    if digits.len() < 2 {
        return digits;
    }
    let year_end = digits.len().min(4);
    format!("{}/{}", &digits[..2], &digits[2..year_end])
}

/// HTTP gateway when `PAYMENT_GATEWAY_URL` is configured, simulated otherwise.
pub fn gateway_from_config(config: &AppConfig) -> Result<Arc<dyn PaymentGateway>, AppError> {
    match &config.payment_gateway_url {
        Some(url) => {
            info!("Using payment gateway at {}", url);
            Ok(Arc::new(HttpPaymentGateway::new(url)?))
        }
        None => {
            info!("Using simulated payment gateway ({:?} latency)", config.payment_latency);
            Ok(Arc::new(SimulatedGateway::new(config.payment_latency)))
        }
    }
}

//! Course checkout: the purchase state machine and the service that drives
//! it against a payment gateway.
//!
//! ```text
//! Idle -> AwaitingPaymentDetails -> Processing -> Completed
//!              ^        |                |   \-> Failed --retry--+
//!              |        v (cancel)       v (cancel)              |
//!              |       Idle             Idle                     |
//!              +-------------------------------------------------+
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::SharedCatalog;
use crate::error::AppError;
use crate::events::PurchaseEvents;
use crate::models::{CardDetails, CheckoutRequest, Course, PaymentMethod, PurchaseEvent};
use crate::payment::{
    ChargeReceipt, ChargeRequest, PaymentError, PaymentGateway, format_card_number, format_expiry_date,
};
use crate::task::{CancelHandle, TaskOutcome, cancellable};
use crate::validation::{FieldError, validate_checkout};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PurchaseState {
    Idle,
    AwaitingPaymentDetails,
    #[serde(rename_all = "camelCase")]
    Processing { payment_method: PaymentMethod },
    #[serde(rename_all = "camelCase")]
    Completed {
        payment_method: PaymentMethod,
        receipt: ChargeReceipt,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        payment_method: PaymentMethod,
        error: PaymentError,
    },
}

impl PurchaseState {
    pub fn name(&self) -> &'static str {
        match self {
            PurchaseState::Idle => "idle",
            PurchaseState::AwaitingPaymentDetails => "awaitingPaymentDetails",
            PurchaseState::Processing { .. } => "processing",
            PurchaseState::Completed { .. } => "completed",
            PurchaseState::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseFlow {
    pub id: Uuid,
    pub course_id: Option<String>,
    pub amount: f64,
    #[serde(flatten)]
    pub state: PurchaseState,
    /// Field errors of the last rejected checkout attempt.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    pub updated_at: String,
}

impl Default for PurchaseFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl PurchaseFlow {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id: None,
            amount: 0.0,
            state: PurchaseState::Idle,
            errors: Vec::new(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    /// `Idle -> AwaitingPaymentDetails` for the chosen course.
    pub fn select(&mut self, course: &Course) -> Result<(), AppError> {
        self.expect("select a course", matches!(self.state, PurchaseState::Idle))?;
        self.course_id = Some(course.id.clone());
        self.amount = course.price;
        self.transition(PurchaseState::AwaitingPaymentDetails);
        Ok(())
    }

    /// `AwaitingPaymentDetails -> Processing`. A rejected submission keeps
    /// the flow waiting and records the field errors.
    pub fn submit(&mut self, req: &CheckoutRequest) -> Result<ChargeRequest, AppError> {
        self.expect(
            "submit payment details",
            matches!(self.state, PurchaseState::AwaitingPaymentDetails),
        )?;
        let course_id = self.course_id.clone().ok_or(AppError::InternalServerError)?;

        if let Err(errors) = validate_checkout(req) {
            self.errors = errors.fields().to_vec();
            return Err(PaymentError::Validation(errors).into());
        }

        self.transition(PurchaseState::Processing {
            payment_method: req.payment_method,
        });
        Ok(ChargeRequest {
            purchase_id: self.id,
            course_id,
            amount: self.amount,
            payment_method: req.payment_method,
            card: (req.payment_method == PaymentMethod::CreditCard).then(|| normalize_card(&req.card)),
        })
    }

    pub fn complete(&mut self, receipt: ChargeReceipt) -> Result<(), AppError> {
        let payment_method = self.processing_method("complete")?;
        self.transition(PurchaseState::Completed { payment_method, receipt });
        Ok(())
    }

    pub fn fail(&mut self, error: PaymentError) -> Result<(), AppError> {
        let payment_method = self.processing_method("fail")?;
        self.transition(PurchaseState::Failed { payment_method, error });
        Ok(())
    }

    /// Abandons checkout from `AwaitingPaymentDetails` or `Processing`.
    pub fn cancel(&mut self) -> Result<(), AppError> {
        self.expect(
            "cancel",
            matches!(
                self.state,
                PurchaseState::AwaitingPaymentDetails | PurchaseState::Processing { .. }
            ),
        )?;
        self.transition(PurchaseState::Idle);
        Ok(())
    }

    /// `Failed -> AwaitingPaymentDetails`.
    pub fn retry(&mut self) -> Result<(), AppError> {
        self.expect("retry", matches!(self.state, PurchaseState::Failed { .. }))?;
        self.transition(PurchaseState::AwaitingPaymentDetails);
        Ok(())
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, PurchaseState::Processing { .. })
    }

    /// Waiting for payment details or for the gateway.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            PurchaseState::AwaitingPaymentDetails | PurchaseState::Processing { .. }
        )
    }

    fn processing_method(&self, action: &str) -> Result<PaymentMethod, AppError> {
        match self.state {
            PurchaseState::Processing { payment_method } => Ok(payment_method),
            _ => Err(self.invalid(action)),
        }
    }

    fn expect(&self, action: &str, allowed: bool) -> Result<(), AppError> {
        if allowed { Ok(()) } else { Err(self.invalid(action)) }
    }

    fn invalid(&self, action: &str) -> AppError {
        AppError::Conflict(format!(
            "cannot {} while purchase is {}",
            action,
            self.state.name()
        ))
    }

    fn transition(&mut self, next: PurchaseState) {
        debug!("Purchase {}: {} -> {}", self.id, self.state.name(), next.name());
        self.state = next;
        self.errors.clear();
        self.updated_at = Utc::now().to_rfc3339();
    }
}

fn normalize_card(card: &CardDetails) -> CardDetails {
    CardDetails {
        cardholder_name: card.cardholder_name.trim().to_string(),
        card_number: format_card_number(&card.card_number),
        expiry_date: format_expiry_date(&card.expiry_date),
        cvv: card.cvv.trim().to_string(),
    }
}

struct PurchaseSession {
    flow: PurchaseFlow,
    cancel: Option<CancelHandle>,
}

#[derive(Clone)]
pub struct PurchaseService {
    catalog: SharedCatalog,
    gateway: Arc<dyn PaymentGateway>,
    events: PurchaseEvents,
    sessions: Arc<Mutex<HashMap<Uuid, PurchaseSession>>>,
}

impl PurchaseService {
    pub fn new(catalog: SharedCatalog, gateway: Arc<dyn PaymentGateway>, events: PurchaseEvents) -> Self {
        Self {
            catalog,
            gateway,
            events,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Opens a purchase for `course_id`. At most one session is kept per
    /// course: an active one rejects the new purchase, an idle or failed one
    /// is replaced.
    pub async fn start(&self, course_id: &str) -> Result<PurchaseFlow, AppError> {
        let mut sessions = self.sessions.lock().await;
        let course = {
            let catalog = self.catalog.read().await;
            let course = catalog.find(course_id).ok_or(AppError::NotFound)?.clone();
            if catalog.is_purchased(course_id) {
                return Err(AppError::Conflict(format!("course {} already purchased", course_id)));
            }
            course
        };

        let mut superseded = Vec::new();
        for (id, session) in sessions.iter() {
            if session.flow.course_id.as_deref() != Some(course_id) {
                continue;
            }
            if session.flow.is_active() {
                return Err(AppError::Conflict(format!(
                    "course {} already has a purchase in progress",
                    course_id
                )));
            }
            superseded.push(*id);
        }
        for id in superseded {
            sessions.remove(&id);
            debug!("Purchase {} superseded", id);
        }

        let mut flow = PurchaseFlow::new();
        flow.select(&course)?;
        info!("Purchase {} started for course {}", flow.id, course.title);

        sessions.insert(
            flow.id,
            PurchaseSession {
                flow: flow.clone(),
                cancel: None,
            },
        );
        Ok(flow)
    }

    pub async fn status(&self, id: Uuid) -> Result<PurchaseFlow, AppError> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&id)
            .map(|s| s.flow.clone())
            .ok_or(AppError::NotFound)
    }

    /// Validates the payment details and starts the charge in the
    /// background. Returns the flow in `Processing`.
    pub async fn checkout(&self, id: Uuid, req: CheckoutRequest) -> Result<PurchaseFlow, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(AppError::NotFound)?;

        let charge = session.flow.submit(&req)?;
        let gateway = self.gateway.clone();
        let (handle, outcome) = cancellable(async move { gateway.charge(&charge).await });
        session.cancel = Some(handle);
        let flow = session.flow.clone();
        drop(sessions);

        info!("Purchase {} processing via {}", id, req.payment_method);
        let service = self.clone();
        tokio::spawn(async move {
            let outcome = outcome.await;
            service.finish(id, outcome).await;
        });

        Ok(flow)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<PurchaseFlow, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(AppError::NotFound)?;

        session.flow.cancel()?;
        if let Some(handle) = session.cancel.take() {
            if handle.cancel() {
                info!("Purchase {} cancelled while processing", id);
            }
        }
        Ok(session.flow.clone())
    }

    pub async fn retry(&self, id: Uuid) -> Result<PurchaseFlow, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(AppError::NotFound)?;
        session.flow.retry()?;
        Ok(session.flow.clone())
    }

    /// Drops every session of a removed course, cancelling a pending charge.
    pub async fn forget_course(&self, course_id: &str) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            if session.flow.course_id.as_deref() != Some(course_id) {
                return true;
            }
            if let Some(handle) = session.cancel.take() {
                if handle.cancel() {
                    info!("Purchase {} cancelled, course {} removed", id, course_id);
                }
            }
            false
        });
        before - sessions.len()
    }

    async fn finish(&self, id: Uuid, outcome: TaskOutcome<ChargeReceipt, PaymentError>) {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(&id) else {
            return;
        };
        session.cancel = None;

        let payment_method = match session.flow.state {
            PurchaseState::Processing { payment_method } => payment_method,
            _ => {
                if matches!(outcome, TaskOutcome::Completed(_)) {
                    warn!("Purchase {} settled after leaving processing; ignoring", id);
                }
                return;
            }
        };

        let receipt = match outcome {
            TaskOutcome::Completed(receipt) => receipt,
            TaskOutcome::Failed(err) => {
                warn!("Purchase {} failed: {}", id, err);
                if let Err(e) = session.flow.fail(err) {
                    error!("Purchase {} could not fail: {}", id, e);
                }
                return;
            }
            TaskOutcome::Cancelled => {
                debug!("Purchase {} charge cancelled", id);
                return;
            }
        };

        let Some(course_id) = session.flow.course_id.clone() else {
            return;
        };
        // the catalog is updated before the flow reports completion
        let recorded = self.catalog.write().await.record_purchase(&course_id);
        match recorded {
            Ok(course) => info!("Course {} purchased ({})", course.title, id),
            Err(e) => {
                warn!("Purchase {} charged but not recorded: {}", id, e);
                if let Err(e) = session.flow.fail(PaymentError::Unavailable(e.to_string())) {
                    error!("Purchase {} could not fail: {}", id, e);
                }
                return;
            }
        }
        if let Err(e) = session.flow.complete(receipt) {
            error!("Purchase {} could not complete: {}", id, e);
            return;
        }
        drop(sessions);

        self.events.send(PurchaseEvent::CoursePurchased {
            purchase_id: id,
            course_id,
            payment_method,
        });
    }
}

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::catalog;
use learnhub::catalog::SharedCatalog;
use learnhub::error::AppError;
use learnhub::events::PurchaseEvents;
use learnhub::models::{CardDetails, CheckoutRequest, PaymentMethod, PurchaseEvent};
use learnhub::payment::{ChargeReceipt, ChargeRequest, PaymentError, PaymentGateway, SimulatedGateway};
use learnhub::services::{PurchaseFlow, PurchaseService, PurchaseState};
use uuid::Uuid;

struct UnreachableGateway;

#[async_trait]
impl PaymentGateway for UnreachableGateway {
    async fn charge(&self, _request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        Err(PaymentError::Network("connection refused".to_string()))
    }
}

fn card(number: &str) -> CardDetails {
    CardDetails {
        cardholder_name: "Jane Doe".to_string(),
        card_number: number.to_string(),
        expiry_date: "12/30".to_string(),
        cvv: "123".to_string(),
    }
}

fn card_checkout(number: &str) -> CheckoutRequest {
    CheckoutRequest {
        payment_method: PaymentMethod::CreditCard,
        card: card(number),
        accept_terms: true,
    }
}

fn service(gateway: Arc<dyn PaymentGateway>) -> (PurchaseService, SharedCatalog, PurchaseEvents) {
    let shared = catalog().into_shared();
    let events = PurchaseEvents::default();
    let service = PurchaseService::new(shared.clone(), gateway, events.clone());
    (service, shared, events)
}

async fn wait_until_settled(service: &PurchaseService, id: Uuid) -> PurchaseFlow {
    for _ in 0..200 {
        let flow = service.status(id).await.expect("purchase exists");
        if !flow.is_processing() {
            return flow;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("purchase {} never left processing", id);
}

#[test]
fn test_flow_requires_terms_and_card_fields() {
    let mut flow = PurchaseFlow::new();
    flow.select(&common::course("a1")).expect("Failed to select course");

    let missing = CheckoutRequest {
        payment_method: PaymentMethod::CreditCard,
        card: CardDetails::default(),
        accept_terms: false,
    };
    let err = flow.submit(&missing).expect_err("submission should be rejected");

    let AppError::Payment(PaymentError::Validation(errors)) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(errors.len(), 5);
    assert!(errors.get("acceptTerms").is_some());
    assert!(errors.get("cardNumber").is_some());
    assert!(errors.get("cvv").is_some());
    assert_eq!(flow.state, PurchaseState::AwaitingPaymentDetails);
    assert_eq!(flow.errors.len(), 5);
}

#[test]
fn test_flow_paypal_only_needs_terms() {
    let mut flow = PurchaseFlow::new();
    flow.select(&common::course("a1")).expect("Failed to select course");

    let charge = flow
        .submit(&CheckoutRequest {
            payment_method: PaymentMethod::Paypal,
            card: CardDetails::default(),
            accept_terms: true,
        })
        .expect("paypal checkout should pass");

    assert!(charge.card.is_none());
    assert_eq!(charge.course_id, "a1");
    assert_eq!(
        flow.state,
        PurchaseState::Processing {
            payment_method: PaymentMethod::Paypal
        }
    );
    assert!(flow.errors.is_empty());
}

#[test]
fn test_flow_rejects_out_of_order_transitions() {
    let mut flow = PurchaseFlow::new();

    assert!(matches!(flow.submit(&card_checkout("4242")), Err(AppError::Conflict(_))));
    assert!(matches!(flow.retry(), Err(AppError::Conflict(_))));
    assert!(matches!(flow.cancel(), Err(AppError::Conflict(_))));

    flow.select(&common::course("a1")).expect("Failed to select course");
    assert!(matches!(flow.select(&common::course("a2")), Err(AppError::Conflict(_))));
    assert!(matches!(flow.retry(), Err(AppError::Conflict(_))));

    flow.cancel().expect("Failed to cancel");
    assert_eq!(flow.state, PurchaseState::Idle);
}

#[tokio::test]
async fn test_purchase_completes_and_moves_course() {
    let (service, shared, events) = service(Arc::new(SimulatedGateway::new(Duration::from_millis(10))));
    let mut rx = events.subscribe();

    let flow = service.start("a1").await.expect("Failed to start purchase");
    assert_eq!(flow.state, PurchaseState::AwaitingPaymentDetails);
    assert_eq!(flow.amount, 99.0);

    let processing = service
        .checkout(flow.id, card_checkout("4242 4242 4242 4242"))
        .await
        .expect("Failed to check out");
    assert!(processing.is_processing());

    let settled = wait_until_settled(&service, flow.id).await;
    assert!(matches!(settled.state, PurchaseState::Completed { .. }));

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no purchase event")
        .expect("event channel closed");
    assert_eq!(
        event,
        PurchaseEvent::CoursePurchased {
            purchase_id: flow.id,
            course_id: "a1".to_string(),
            payment_method: PaymentMethod::CreditCard,
        }
    );

    let catalog = shared.read().await;
    assert!(catalog.is_purchased("a1"));
    assert!(!catalog.available().iter().any(|c| c.id == "a1"));
    assert_eq!(catalog.find("a1").and_then(|c| c.progress), Some(0));
}

#[tokio::test]
async fn test_declined_card_fails_and_can_retry() {
    let gateway = SimulatedGateway::new(Duration::from_millis(5)).decline_card("4000000000000002");
    let (service, shared, _events) = service(Arc::new(gateway));

    let flow = service.start("a2").await.expect("Failed to start purchase");
    service
        .checkout(flow.id, card_checkout("4000 0000 0000 0002"))
        .await
        .expect("Failed to check out");

    let settled = wait_until_settled(&service, flow.id).await;
    let PurchaseState::Failed { error, .. } = &settled.state else {
        panic!("expected failure, got {:?}", settled.state);
    };
    assert!(matches!(error, PaymentError::Declined(_)));
    assert!(!shared.read().await.is_purchased("a2"));

    let retried = service.retry(flow.id).await.expect("Failed to retry");
    assert_eq!(retried.state, PurchaseState::AwaitingPaymentDetails);

    service
        .checkout(flow.id, card_checkout("4242 4242 4242 4242"))
        .await
        .expect("Failed to check out");
    let settled = wait_until_settled(&service, flow.id).await;
    assert!(matches!(settled.state, PurchaseState::Completed { .. }));
    assert!(shared.read().await.is_purchased("a2"));
}

#[tokio::test]
async fn test_network_failure_is_reported() {
    let (service, _shared, _events) = service(Arc::new(UnreachableGateway));

    let flow = service.start("a3").await.expect("Failed to start purchase");
    service
        .checkout(flow.id, card_checkout("4242 4242 4242 4242"))
        .await
        .expect("Failed to check out");

    let settled = wait_until_settled(&service, flow.id).await;
    assert!(matches!(
        settled.state,
        PurchaseState::Failed {
            error: PaymentError::Network(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_cancel_while_processing_leaves_catalog_alone() {
    let (service, shared, events) = service(Arc::new(SimulatedGateway::new(Duration::from_millis(200))));
    let mut rx = events.subscribe();

    let flow = service.start("a1").await.expect("Failed to start purchase");
    service
        .checkout(flow.id, card_checkout("4242 4242 4242 4242"))
        .await
        .expect("Failed to check out");

    let cancelled = service.cancel(flow.id).await.expect("Failed to cancel");
    assert_eq!(cancelled.state, PurchaseState::Idle);

    tokio::time::sleep(Duration::from_millis(400)).await;

    let status = service.status(flow.id).await.expect("purchase exists");
    assert_eq!(status.state, PurchaseState::Idle);
    assert!(!shared.read().await.is_purchased("a1"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_start_rejects_owned_and_unknown_courses() {
    let (service, _shared, _events) = service(Arc::new(SimulatedGateway::new(Duration::ZERO)));

    assert!(matches!(service.start("p1").await, Err(AppError::Conflict(_))));
    assert!(matches!(service.start("missing").await, Err(AppError::NotFound)));
    assert!(matches!(service.status(Uuid::new_v4()).await, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_course_cannot_be_bought_twice() {
    let (service, shared, events) = service(Arc::new(SimulatedGateway::new(Duration::from_millis(20))));
    let mut rx = events.subscribe();

    let first = service.start("a1").await.expect("Failed to start purchase");
    assert!(matches!(service.start("a1").await, Err(AppError::Conflict(_))));

    service
        .checkout(first.id, card_checkout("4242 4242 4242 4242"))
        .await
        .expect("Failed to check out");
    assert!(matches!(service.start("a1").await, Err(AppError::Conflict(_))));

    let settled = wait_until_settled(&service, first.id).await;
    assert!(matches!(settled.state, PurchaseState::Completed { .. }));
    assert!(matches!(service.start("a1").await, Err(AppError::Conflict(_))));

    rx.recv().await.expect("no purchase event");
    assert!(rx.try_recv().is_err());
    assert_eq!(shared.read().await.purchased().len(), 3);
}

#[tokio::test]
async fn test_new_purchase_replaces_cancelled_one() {
    let (service, _shared, _events) = service(Arc::new(SimulatedGateway::new(Duration::ZERO)));

    let first = service.start("a2").await.expect("Failed to start purchase");
    service.cancel(first.id).await.expect("Failed to cancel");

    let second = service.start("a2").await.expect("Failed to restart purchase");
    assert_ne!(first.id, second.id);
    assert!(matches!(service.status(first.id).await, Err(AppError::NotFound)));
    assert_eq!(
        service.status(second.id).await.expect("purchase exists").state,
        PurchaseState::AwaitingPaymentDetails
    );
}

#[tokio::test]
async fn test_charge_for_removed_course_fails() {
    let (service, shared, events) = service(Arc::new(SimulatedGateway::new(Duration::from_millis(50))));
    let mut rx = events.subscribe();

    let flow = service.start("a2").await.expect("Failed to start purchase");
    service
        .checkout(flow.id, card_checkout("4242 4242 4242 4242"))
        .await
        .expect("Failed to check out");
    shared.write().await.remove("a2");

    let settled = wait_until_settled(&service, flow.id).await;
    assert!(matches!(
        settled.state,
        PurchaseState::Failed {
            error: PaymentError::Unavailable(_),
            ..
        }
    ));
    assert!(rx.try_recv().is_err());
    assert!(!shared.read().await.is_purchased("a2"));
}

#[tokio::test]
async fn test_forget_course_cancels_pending_charge() {
    let (service, shared, events) = service(Arc::new(SimulatedGateway::new(Duration::from_millis(100))));
    let mut rx = events.subscribe();

    let flow = service.start("a1").await.expect("Failed to start purchase");
    service
        .checkout(flow.id, card_checkout("4242 4242 4242 4242"))
        .await
        .expect("Failed to check out");

    assert_eq!(service.forget_course("a1").await, 1);
    assert!(matches!(service.status(flow.id).await, Err(AppError::NotFound)));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
    assert!(!shared.read().await.is_purchased("a1"));
}

#[test]
fn test_card_input_is_normalised_before_charging() {
    let mut flow = PurchaseFlow::new();
    flow.select(&common::course("a1")).expect("Failed to select course");

    let charge = flow
        .submit(&CheckoutRequest {
            payment_method: PaymentMethod::CreditCard,
            card: CardDetails {
                cardholder_name: "  Jane Doe ".to_string(),
                card_number: "4242424242424242".to_string(),
                expiry_date: "1230".to_string(),
                cvv: "123".to_string(),
            },
            accept_terms: true,
        })
        .expect("checkout should pass");

    let card = charge.card.expect("card details missing");
    assert_eq!(card.cardholder_name, "Jane Doe");
    assert_eq!(card.card_number, "4242 4242 4242 4242");
    assert_eq!(card.expiry_date, "12/30");
}

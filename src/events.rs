use tokio::sync::broadcast;

use crate::models::PurchaseEvent;

/// Fan-out of purchase events to whoever subscribed.
#[derive(Debug, Clone)]
pub struct PurchaseEvents {
    tx: broadcast::Sender<PurchaseEvent>,
}

impl PurchaseEvents {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Returns the number of subscribers that received the event.
    pub fn send(&self, event: PurchaseEvent) -> usize {
        self.tx.send(event).unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PurchaseEvent> {
        self.tx.subscribe()
    }
}

impl Default for PurchaseEvents {
    fn default() -> Self {
        Self::new(64)
    }
}

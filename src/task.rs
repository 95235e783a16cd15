//! Cancellable async operations.
//!
//! A long-running call is split into a [`CancelHandle`] and an outcome
//! future, so whoever owns the handle can abandon the call while the
//! future is driven elsewhere.

use std::future::Future;

use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T, E> {
    Completed(T),
    Failed(E),
    Cancelled,
}

#[derive(Debug)]
pub struct CancelHandle {
    tx: oneshot::Sender<()>,
}

impl CancelHandle {
    /// Returns `false` if the operation had already finished.
    pub fn cancel(self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Wraps `fut` so it resolves to [`TaskOutcome::Cancelled`] once the handle
/// is used. Dropping the handle does not cancel.
pub fn cancellable<F, T, E>(fut: F) -> (CancelHandle, impl Future<Output = TaskOutcome<T, E>>)
where
    F: Future<Output = Result<T, E>>,
{
    let (tx, rx) = oneshot::channel::<()>();

    let outcome = async move {
        tokio::select! {
            biased;
            Ok(()) = rx => TaskOutcome::Cancelled,
            result = fut => match result {
                Ok(value) => TaskOutcome::Completed(value),
                Err(err) => TaskOutcome::Failed(err),
            },
        }
    };

    (CancelHandle { tx }, outcome)
}

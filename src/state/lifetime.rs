//! Cancellation tied to the lifetime of the screen that started an operation.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::watch;

/// Returned when an operation stops because its [`Lifetime`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Owner side of a cancellation scope. Dropping it cancels every token.
#[derive(Debug)]
pub struct Lifetime {
    tx: Arc<watch::Sender<bool>>,
}

/// Cloneable handle that can end a [`Lifetime`] from another task.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Observer side handed to timers and polling loops.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl Lifetime {
    /// Start a new, live scope.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Token observing this scope.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Handle that can cancel this scope from elsewhere.
    pub fn handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.tx),
        }
    }

    /// End the scope now.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

impl CancelHandle {
    /// End the scope this handle belongs to.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// Whether the scope has ended.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the scope ends.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // A closed channel means every owner is gone, which also ends the scope.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleep for `duration` unless the scope ends first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

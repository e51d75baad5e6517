//! Cancellation tied to the lifetime of one mounted checkout.
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable token that flips to cancelled once and stays there.
///
/// Every timer, retry and response continuation scheduled for a checkout
/// holds a clone and checks it before touching shared state.
#[derive(Debug, Clone)]
pub struct LifetimeToken {
    tx: Arc<watch::Sender<bool>>,
}

impl LifetimeToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for LifetimeToken {
    fn default() -> Self {
        Self::new()
    }
}

//! User-facing notifications and caller callbacks.
use crate::types::PaymentOrderHandle;
use tracing::{info, warn};

/// Transient messages shown to the shopper (toasts in the storefront).
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Writes notifications to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!(target: "storefront_checkout::notify", %message, "notify success");
    }

    fn error(&self, message: &str) {
        warn!(target: "storefront_checkout::notify", %message, "notify error");
    }
}

/// Hooks the embedding page reacts to. Success and failure are mutually
/// exclusive within one attempt, and each fires at most once.
pub trait CheckoutCallbacks: Send + Sync {
    /// Runs while the checkout holds its lifetime lock, so it must not call
    /// back into the orchestrator.
    fn on_payment_order_created(&self, _handle: &PaymentOrderHandle) {}

    fn on_payment_success(&self) {}

    fn on_payment_failure(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl CheckoutCallbacks for NoopCallbacks {}

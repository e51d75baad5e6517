use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod loader;
pub mod options;

pub use loader::{GatewayLoadError, GatewayReadiness, ScriptHost, ScriptLoader};
pub use options::SessionConfig;

#[derive(Debug, Clone, Error)]
pub enum WidgetError {
    #[error("Payment gateway is not available: {0}")]
    Unavailable(String),
    #[error("Failed to open payment gateway: {0}")]
    OpenFailed(String),
}

/// Handler payload for a provider-reported success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSuccess {
    #[serde(rename = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(rename = "razorpay_order_id", default)]
    pub provider_order_id: Option<String>,
    #[serde(rename = "razorpay_signature")]
    pub signature: String,
}

/// Payload of the provider's `payment.failed` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderFailure {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ProviderFailure {
    pub fn message(&self) -> String {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("Payment failed")
            .to_string()
    }
}

/// The single terminal event of one widget session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    Success(ProviderSuccess),
    Failed(ProviderFailure),
    Dismissed,
}

/// The provider's hosted checkout.
///
/// `open` resolves once the user finishes with the widget, with exactly one
/// of success, reported failure or dismissal. There is no timeout: the
/// session stays open until the user or the provider ends it.
#[async_trait]
pub trait PaymentWidget: Send + Sync {
    async fn open(&self, config: &SessionConfig) -> Result<WidgetEvent, WidgetError>;
}

//! Type definitions for global use.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    Razorpay,
    Stripe,
    #[serde(other)]
    Other,
}

impl Provider {
    pub fn get_display_name(&self) -> String {
        match self {
            Provider::Razorpay => "Razorpay",
            Provider::Stripe => "Stripe",
            Provider::Other => "Other",
        }
        .to_string()
    }

    pub fn is_razorpay(&self) -> bool {
        matches!(self, Provider::Razorpay)
    }
}

/// Body of the backend's create-order call. Built fresh for every attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub order_id: String,
}

impl PaymentIntentRequest {
    pub fn new(amount: Decimal, currency: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            order_id: order_id.into(),
        }
    }

    /// Whether the request may be sent at all: a positive amount and an order id.
    pub fn is_payable(&self) -> bool {
        self.amount > Decimal::ZERO && !self.order_id.trim().is_empty()
    }
}

/// Raw create-order response. The gateway key is optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderResponse {
    pub payment_order_id: String,
    pub provider: Provider,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl PaymentOrderResponse {
    /// Promotes the response to a handle, or `None` when the gateway key is absent.
    pub fn into_handle(self) -> Option<PaymentOrderHandle> {
        let key = self.key.filter(|key| !key.trim().is_empty())?;
        Some(PaymentOrderHandle {
            payment_order_id: self.payment_order_id,
            provider: self.provider,
            amount: self.amount,
            currency: self.currency,
            key,
        })
    }
}

/// A provider order ready to be opened in the hosted widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderHandle {
    pub payment_order_id: String,
    pub provider: Provider,
    pub amount: Decimal,
    pub currency: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReceipt {
    pub message: String,
    pub payment_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: String,
    pub provider: Provider,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Netbanking,
    Wallet,
    Upi,
}

impl PaymentMethod {
    pub fn all() -> Vec<PaymentMethod> {
        vec![
            PaymentMethod::Card,
            PaymentMethod::Netbanking,
            PaymentMethod::Wallet,
            PaymentMethod::Upi,
        ]
    }
}

/// Where a failed attempt gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The session could not be built or opened.
    Session,
    /// The provider reported the payment as failed.
    Provider,
    /// The backend refused to confirm a provider-reported success.
    Verification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success { payment_id: String },
    Failure { stage: FailureStage, reason: String },
    Cancelled,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PaymentOutcome::Failure { .. })
    }
}

//! Backend confirmation of a provider-reported payment.
use crate::api::{ApiError, PaymentsApi};
use crate::types::{VerificationReceipt, VerificationRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, Error)]
pub enum VerificationError {
    #[error("{0}")]
    Rejected(ApiError),
    #[error("Payment verification failed: {0}")]
    Unreachable(ApiError),
}

impl VerificationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(err) => err.to_string(),
            Self::Unreachable(_) => "Payment verification failed".to_string(),
        }
    }
}

/// Submits proof of payment to the backend.
///
/// The provider's success callback is provisional; only a 2xx from this
/// call confirms the payment. Failures are final for the attempt.
pub struct PaymentVerifier {
    api: Arc<dyn PaymentsApi>,
}

impl PaymentVerifier {
    pub fn new(api: Arc<dyn PaymentsApi>) -> Self {
        Self { api }
    }

    pub async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationReceipt, VerificationError> {
        match self.api.verify_payment(request).await {
            Ok(receipt) => {
                info!(
                    order_id = %request.order_id,
                    payment_id = %receipt.payment_id,
                    message = %receipt.message,
                    "payment verified"
                );
                Ok(receipt)
            }
            Err(err) => {
                error!(
                    order_id = %request.order_id,
                    payment_id = %request.payment_id,
                    error = %err,
                    "payment verification error"
                );
                Err(match err {
                    ApiError::NetworkError(_) | ApiError::ParseError(_) => {
                        VerificationError::Unreachable(err)
                    }
                    other => VerificationError::Rejected(other),
                })
            }
        }
    }
}

//! Order-intent acquisition: grace delay, create-order call, bounded retries.
use crate::api::{ApiError, PaymentsApi};
use crate::config::AcquisitionConfig;
use crate::lifetime::LifetimeToken;
use crate::types::{PaymentIntentRequest, PaymentOrderHandle};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Error)]
pub enum AcquisitionError {
    #[error("Checkout was torn down before the payment order was created")]
    Cancelled,
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),
    #[error("Payment gateway key not available. Please check backend configuration.")]
    MissingGatewayKey,
    #[error("Order not found after {attempts} attempts")]
    OrderNotFound { attempts: u32, source: ApiError },
    #[error("{0}")]
    AuthenticationFailed(ApiError),
    #[error("{0}")]
    Backend(ApiError),
}

impl AcquisitionError {
    /// Inline error text shown next to the payment section.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationFailed(_) => {
                "Payment gateway authentication failed. Please check your payment gateway credentials."
                    .to_string()
            }
            Self::OrderNotFound { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    /// Transient notification text.
    pub fn notification(&self) -> String {
        match self {
            Self::AuthenticationFailed(_) => {
                "Payment gateway authentication failed. Please contact support.".to_string()
            }
            other => other.user_message(),
        }
    }

    /// Structured backend payload behind the error, if the backend sent one.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::OrderNotFound { source, .. }
            | Self::AuthenticationFailed(source)
            | Self::Backend(source) => source.payload(),
            _ => None,
        }
    }
}

/// Obtains a [`PaymentOrderHandle`] from the backend.
pub struct OrderIntentAcquirer {
    api: Arc<dyn PaymentsApi>,
    grace_period: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl OrderIntentAcquirer {
    pub fn new(api: Arc<dyn PaymentsApi>, policy: &AcquisitionConfig) -> Self {
        Self {
            api,
            grace_period: policy.grace_period(),
            max_retries: policy.max_retries,
            retry_delay: policy.retry_delay(),
        }
    }

    /// Runs one acquisition against `lifetime`.
    ///
    /// Waits the grace period, then calls create-order. "Order not found" is
    /// retried `max_retries` times with a fixed delay; every other failure is
    /// returned at once. Once `lifetime` is cancelled nothing further is sent
    /// and any late response is discarded as [`AcquisitionError::Cancelled`].
    pub async fn acquire(
        &self,
        request: &PaymentIntentRequest,
        lifetime: &LifetimeToken,
    ) -> Result<PaymentOrderHandle, AcquisitionError> {
        if request.amount <= rust_decimal::Decimal::ZERO {
            return Err(AcquisitionError::InvalidRequest(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }
        if request.order_id.trim().is_empty() {
            return Err(AcquisitionError::InvalidRequest(
                "order id is required".to_string(),
            ));
        }

        Self::sleep_unless_cancelled(self.grace_period, lifetime).await?;

        let mut retries = 0;
        loop {
            let attempt = retries + 1;
            debug!(order_id = %request.order_id, attempt, "creating payment order");
            let result = tokio::select! {
                _ = lifetime.cancelled() => return Err(AcquisitionError::Cancelled),
                result = self.api.create_payment_order(request) => result,
            };
            if lifetime.is_cancelled() {
                return Err(AcquisitionError::Cancelled);
            }

            match result {
                Ok(response) => {
                    let payment_order_id = response.payment_order_id.clone();
                    let Some(handle) = response.into_handle() else {
                        error!(%payment_order_id, "payment order response missing key field");
                        return Err(AcquisitionError::MissingGatewayKey);
                    };
                    info!(
                        order_id = %request.order_id,
                        payment_order_id = %handle.payment_order_id,
                        attempt,
                        "payment order created"
                    );
                    return Ok(handle);
                }
                Err(err) if err.is_order_not_found() && retries < self.max_retries => {
                    retries += 1;
                    warn!(
                        order_id = %request.order_id,
                        attempt,
                        retry = retries,
                        "order not visible to payments yet, retrying"
                    );
                    Self::sleep_unless_cancelled(self.retry_delay, lifetime).await?;
                }
                Err(err) if err.is_order_not_found() => {
                    error!(order_id = %request.order_id, attempts = attempt, "order not found, giving up");
                    return Err(AcquisitionError::OrderNotFound {
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) if err.is_authentication() => {
                    error!(order_id = %request.order_id, payload = ?err.payload(), "payment gateway authentication error");
                    return Err(AcquisitionError::AuthenticationFailed(err));
                }
                Err(err) => {
                    error!(order_id = %request.order_id, error = %err, payload = ?err.payload(), "error creating payment order");
                    return Err(AcquisitionError::Backend(err));
                }
            }
        }
    }

    async fn sleep_unless_cancelled(
        delay: Duration,
        lifetime: &LifetimeToken,
    ) -> Result<(), AcquisitionError> {
        tokio::select! {
            _ = lifetime.cancelled() => Err(AcquisitionError::Cancelled),
            _ = tokio::time::sleep(delay) => {
                if lifetime.is_cancelled() {
                    Err(AcquisitionError::Cancelled)
                } else {
                    Ok(())
                }
            }
        }
    }
}

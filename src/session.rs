//! Drives one hosted-widget payment session.
use crate::gateway::options::SessionBranding;
use crate::gateway::{GatewayReadiness, PaymentWidget, SessionConfig, WidgetEvent};
use crate::types::{FailureStage, PaymentOrderHandle, PaymentOutcome, VerificationRequest};
use crate::verification::PaymentVerifier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why `initiate` refused to open a session.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SessionRejection {
    #[error("Payment order not ready. Please wait...")]
    OrderNotReady,
    #[error("Payment gateway not loaded. Please refresh the page.")]
    GatewayNotLoaded,
    #[error("A payment session is already in progress")]
    AlreadyInFlight,
}

#[derive(Debug, Clone)]
struct ActiveOrder {
    order_id: String,
    handle: PaymentOrderHandle,
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PaymentSessionController {
    widget: Arc<dyn PaymentWidget>,
    verifier: PaymentVerifier,
    readiness: Arc<GatewayReadiness>,
    branding: SessionBranding,
    active: Mutex<Option<ActiveOrder>>,
    in_flight: AtomicBool,
}

impl PaymentSessionController {
    pub fn new(
        widget: Arc<dyn PaymentWidget>,
        verifier: PaymentVerifier,
        readiness: Arc<GatewayReadiness>,
        branding: SessionBranding,
    ) -> Self {
        Self {
            widget,
            verifier,
            readiness,
            branding,
            active: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    pub(crate) fn set_readiness(&mut self, readiness: Arc<GatewayReadiness>) {
        self.readiness = readiness;
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveOrder>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes `handle` the one active handle, replacing any previous one.
    pub fn install_handle(&self, order_id: &str, handle: PaymentOrderHandle) {
        *self.active() = Some(ActiveOrder {
            order_id: order_id.to_string(),
            handle,
        });
    }

    pub fn clear_handle(&self) {
        self.active().take();
    }

    pub fn handle(&self) -> Option<PaymentOrderHandle> {
        self.active().as_ref().map(|active| active.handle.clone())
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Opens the widget for the active handle and resolves with the outcome.
    ///
    /// Rejections are checked in order: no handle, gateway not ready, session
    /// already open. A provider-reported success is only returned as
    /// [`PaymentOutcome::Success`] after the backend verified it; the
    /// in-flight flag stays set until then.
    pub async fn initiate(&self) -> Result<PaymentOutcome, SessionRejection> {
        let active = self.active().clone().ok_or(SessionRejection::OrderNotReady)?;
        if !self.readiness.is_ready() {
            return Err(SessionRejection::GatewayNotLoaded);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(order_id = %active.order_id, "payment session already in flight");
            return Err(SessionRejection::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let config = match SessionConfig::for_order(&active.handle, &active.order_id, &self.branding)
        {
            Ok(config) => config,
            Err(err) => {
                error!(order_id = %active.order_id, error = %err, "error initializing payment");
                return Ok(PaymentOutcome::Failure {
                    stage: FailureStage::Session,
                    reason: err.to_string(),
                });
            }
        };

        info!(
            order_id = %active.order_id,
            payment_order_id = %config.order_id,
            amount = config.amount,
            currency = %config.currency,
            "opening payment gateway"
        );
        let event = match self.widget.open(&config).await {
            Ok(event) => event,
            Err(err) => {
                error!(order_id = %active.order_id, error = %err, "error opening payment gateway");
                return Ok(PaymentOutcome::Failure {
                    stage: FailureStage::Session,
                    reason: err.to_string(),
                });
            }
        };

        let outcome = match event {
            WidgetEvent::Success(success) => {
                let request = VerificationRequest {
                    payment_id: success.payment_id,
                    order_id: active.order_id.clone(),
                    signature: success.signature,
                };
                match self.verifier.verify(&request).await {
                    Ok(receipt) => PaymentOutcome::Success {
                        payment_id: receipt.payment_id,
                    },
                    Err(err) => PaymentOutcome::Failure {
                        stage: FailureStage::Verification,
                        reason: err.user_message(),
                    },
                }
            }
            WidgetEvent::Failed(failure) => {
                warn!(
                    order_id = %active.order_id,
                    code = ?failure.code,
                    reason = ?failure.reason,
                    "payment failed"
                );
                PaymentOutcome::Failure {
                    stage: FailureStage::Provider,
                    reason: failure.message(),
                }
            }
            WidgetEvent::Dismissed => {
                info!(order_id = %active.order_id, "payment modal dismissed");
                PaymentOutcome::Cancelled
            }
        };
        Ok(outcome)
    }
}

//! Checkout core module.
use crate::acquirer::{AcquisitionError, OrderIntentAcquirer};
use crate::api::{HttpPaymentsApi, PaymentsApi};
use crate::config::{ConfigError, ConfigManager};
use crate::gateway::options::SessionBranding;
use crate::gateway::{GatewayLoadError, GatewayReadiness, PaymentWidget, ScriptHost, ScriptLoader};
use crate::lifetime::LifetimeToken;
use crate::notify::{CheckoutCallbacks, LogNotifier, NoopCallbacks, Notifier};
use crate::session::{PaymentSessionController, SessionRejection};
use crate::types::{PaymentIntentRequest, PaymentOrderHandle, PaymentOutcome};
use crate::verification::PaymentVerifier;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

const MISSING_ORDER_MESSAGE: &str = "Order ID is missing. Please complete the previous steps.";

/// Orchestrates the checkout payment step.
///
/// `prepare` loads the gateway library and acquires a payment order
/// concurrently; `initiate_payment` opens the hosted widget once both are
/// ready. Changing the order through `prepare` cancels any acquisition still
/// running for the previous one.
///
/// # Examples
///
/// ```rust,ignore
/// use storefront_checkout::core::CheckoutOrchestrator;
/// use storefront_checkout::config::ConfigManager;
/// use storefront_checkout::types::PaymentIntentRequest;
/// use rust_decimal_macros::dec;
///
/// # async fn example(widget: Arc<dyn PaymentWidget>, host: Arc<dyn ScriptHost>) -> Result<(), Box<dyn std::error::Error>> {
/// let checkout = CheckoutOrchestrator::with_http_api(&ConfigManager::new()?, widget, host)?
///     .with_callbacks(Arc::new(MyCallbacks));
///
/// checkout
///     .prepare(PaymentIntentRequest::new(dec!(500.00), "INR", "ord_123"))
///     .await?;
///
/// // Shopper clicks "Pay Now"
/// let outcome = checkout.initiate_payment().await?;
/// # Ok(())
/// # }
/// ```
pub struct CheckoutOrchestrator {
    acquirer: OrderIntentAcquirer,
    loader: ScriptLoader,
    controller: PaymentSessionController,
    notifier: Arc<dyn Notifier>,
    callbacks: Arc<dyn CheckoutCallbacks>,
    state: Mutex<CheckoutState>,
    lifetime: Mutex<LifetimeToken>,
}

/// What the payment section currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutState {
    pub loading: bool,
    pub processing: bool,
    pub gateway_ready: bool,
    pub error: Option<String>,
    pub handle: Option<PaymentOrderHandle>,
}

impl CheckoutState {
    /// Mirrors the "Pay Now" button being enabled.
    pub fn can_pay(&self) -> bool {
        !self.processing && self.gateway_ready && self.handle.is_some()
    }

    pub fn status_line(&self) -> &'static str {
        match (&self.handle, self.loading) {
            (None, true) => "Creating payment order... (This may take a few seconds)",
            (None, false) => "Waiting for payment order to be created...",
            (Some(_), _) if self.processing => "Opening payment gateway...",
            (Some(_), _) if !self.gateway_ready => "Loading payment gateway...",
            (Some(_), _) => "Ready to process payment",
        }
    }
}

impl CheckoutOrchestrator {
    pub fn new(
        config_manager: &ConfigManager,
        api: Arc<dyn PaymentsApi>,
        widget: Arc<dyn PaymentWidget>,
        host: Arc<dyn ScriptHost>,
    ) -> Result<Self, CheckoutError> {
        let config = config_manager.get_config();
        let readiness = GatewayReadiness::global();
        let loader = ScriptLoader::new(
            host,
            readiness.clone(),
            config_manager.get_script_url()?,
            Duration::from_millis(config.gateway.settle_delay_ms),
        );
        let branding = SessionBranding {
            merchant_name: config.storefront.name.clone(),
            theme_color: config.gateway.theme_color.clone(),
            payment_methods: config.gateway.payment_methods.clone(),
            default_currency: config.storefront.default_currency.clone(),
        };
        let controller = PaymentSessionController::new(
            widget,
            PaymentVerifier::new(api.clone()),
            readiness,
            branding,
        );
        Ok(Self {
            acquirer: OrderIntentAcquirer::new(api, &config.acquisition),
            loader,
            controller,
            notifier: Arc::new(LogNotifier),
            callbacks: Arc::new(NoopCallbacks),
            state: Mutex::new(CheckoutState::default()),
            lifetime: Mutex::new(LifetimeToken::new()),
        })
    }

    pub fn with_http_api(
        config_manager: &ConfigManager,
        widget: Arc<dyn PaymentWidget>,
        host: Arc<dyn ScriptHost>,
    ) -> Result<Self, CheckoutError> {
        let api = HttpPaymentsApi::from_config(config_manager)?;
        Self::new(config_manager, Arc::new(api), widget, host)
    }

    pub fn with_callbacks(mut self, callbacks: Arc<dyn CheckoutCallbacks>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Uses `readiness` instead of the process-wide gateway readiness.
    pub fn with_readiness(mut self, readiness: Arc<GatewayReadiness>) -> Self {
        self.loader.set_readiness(readiness.clone());
        self.controller.set_readiness(readiness);
        self
    }

    fn state(&self) -> MutexGuard<'_, CheckoutState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update_state<F>(&self, updater: F)
    where
        F: FnOnce(&mut CheckoutState),
    {
        updater(&mut self.state());
    }

    /// Snapshot of the payment section state.
    pub fn snapshot(&self) -> CheckoutState {
        let mut state = self.state().clone();
        state.processing = self.controller.is_in_flight();
        state.gateway_ready = self.loader.readiness().is_ready();
        state
    }

    /// Starts a new lifetime, cancelling the previous one.
    fn renew_lifetime(&self) -> LifetimeToken {
        let mut lifetime = self
            .lifetime
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        lifetime.cancel();
        *lifetime = LifetimeToken::new();
        lifetime.clone()
    }

    /// Tears the checkout down: pending timers and responses become no-ops.
    pub fn unmount(&self) {
        self.lifetime
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .cancel();
    }

    /// Loads the gateway and acquires a payment order for `request`.
    ///
    /// The order is installed and announced as soon as it is created, even
    /// while the gateway library is still loading. Replaces the active
    /// handle: the previous one is dropped immediately and any acquisition
    /// still running for it is cancelled. Results that arrive after the
    /// lifetime ended are discarded.
    pub async fn prepare(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentOrderHandle, CheckoutError> {
        let lifetime = self.renew_lifetime();
        self.controller.clear_handle();
        let attempt_id = Uuid::new_v4();
        let span = info_span!("checkout_prepare", %attempt_id, order_id = %request.order_id);

        if request.order_id.trim().is_empty() {
            self.update_state(|state| {
                state.handle = None;
                state.loading = false;
                state.error = Some(MISSING_ORDER_MESSAGE.to_string());
            });
            return Err(CheckoutError::MissingOrder);
        }
        if !request.is_payable() {
            self.update_state(|state| {
                state.handle = None;
                state.loading = false;
            });
            return Err(CheckoutError::Acquisition(AcquisitionError::InvalidRequest(
                format!("amount must be positive, got {}", request.amount),
            )));
        }

        self.update_state(|state| {
            state.handle = None;
            state.loading = true;
            state.error = None;
        });

        // Independent branches: each applies its own result as soon as it lands.
        let (loaded, acquired) = tokio::join!(
            self.load_gateway(&lifetime).instrument(span.clone()),
            self.acquire_order(&request, &lifetime)
                .instrument(span.clone()),
        );

        let handle = acquired?;
        loaded?;
        Ok(handle)
    }

    async fn load_gateway(&self, lifetime: &LifetimeToken) -> Result<(), GatewayLoadError> {
        let loaded = self.loader.ensure_ready().await;
        if let Err(err) = &loaded {
            // Readiness is page-wide, so the message stands even if this checkout is gone.
            self.update_state(|state| state.error = Some(err.user_message()));
            if !lifetime.is_cancelled() {
                self.notifier.error(&err.user_message());
            }
        }
        loaded
    }

    async fn acquire_order(
        &self,
        request: &PaymentIntentRequest,
        lifetime: &LifetimeToken,
    ) -> Result<PaymentOrderHandle, CheckoutError> {
        let acquired = self.acquirer.acquire(request, lifetime).await;

        // Held while applying so a concurrent `prepare` cannot interleave.
        let current = self
            .lifetime
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if lifetime.is_cancelled() {
            info!("checkout lifetime ended, discarding payment order result");
            return Err(CheckoutError::Acquisition(AcquisitionError::Cancelled));
        }

        match acquired {
            Ok(handle) => {
                self.controller
                    .install_handle(&request.order_id, handle.clone());
                self.update_state(|state| {
                    state.loading = false;
                    state.handle = Some(handle.clone());
                });
                self.callbacks.on_payment_order_created(&handle);
                drop(current);
                Ok(handle)
            }
            Err(err) => {
                warn!(error = %err, "payment order acquisition failed");
                self.update_state(|state| {
                    state.loading = false;
                    state.error = Some(err.user_message());
                });
                drop(current);
                self.notifier.error(&err.notification());
                Err(CheckoutError::Acquisition(err))
            }
        }
    }

    /// Opens the hosted widget for the active payment order.
    ///
    /// Rejections are reported to the shopper and returned; they never fire
    /// a callback. Otherwise exactly one of the success callback, the failure
    /// callback, or neither (dismissal) fires.
    pub async fn initiate_payment(&self) -> Result<PaymentOutcome, CheckoutError> {
        let attempt_id = Uuid::new_v4();
        let span = info_span!("checkout_payment", %attempt_id);

        if !self.controller.is_in_flight() {
            self.update_state(|state| state.error = None);
        }
        let outcome = match self.controller.initiate().instrument(span.clone()).await {
            Ok(outcome) => outcome,
            Err(rejection) => {
                match rejection {
                    SessionRejection::OrderNotReady => self.notifier.error(&rejection.to_string()),
                    SessionRejection::GatewayNotLoaded => {
                        self.notifier.error(&rejection.to_string());
                        self.update_state(|state| {
                            state.error = Some(
                                "Payment gateway SDK not loaded. Please refresh the page."
                                    .to_string(),
                            )
                        });
                    }
                    SessionRejection::AlreadyInFlight => {}
                }
                return Err(CheckoutError::Rejected(rejection));
            }
        };

        let _entered = span.enter();
        match &outcome {
            PaymentOutcome::Success { payment_id } => {
                info!(%payment_id, "payment successful");
                self.notifier.success("Payment successful!");
                self.callbacks.on_payment_success();
            }
            PaymentOutcome::Failure { stage, reason } => {
                warn!(?stage, %reason, "payment attempt failed");
                self.notifier.error(reason);
                self.update_state(|state| state.error = Some(reason.clone()));
                self.callbacks.on_payment_failure();
            }
            PaymentOutcome::Cancelled => {
                self.notifier.error("Payment cancelled");
            }
        }
        Ok(outcome)
    }

    /// Prepares `request` and immediately opens the widget.
    pub async fn checkout(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentOutcome, CheckoutError> {
        self.prepare(request).await?;
        self.initiate_payment().await
    }

    pub fn handle(&self) -> Option<PaymentOrderHandle> {
        self.controller.handle()
    }
}

impl Drop for CheckoutOrchestrator {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("{}", MISSING_ORDER_MESSAGE)]
    MissingOrder,
    #[error("{0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("{0}")]
    GatewayLoad(#[from] GatewayLoadError),
    #[error("{0}")]
    Rejected(#[from] SessionRejection),
}

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_checkout::api::{ApiError, PaymentsApi};
use storefront_checkout::config::{CheckoutConfig, ConfigBuilder, ConfigManager};
use storefront_checkout::gateway::{
    PaymentWidget, ProviderFailure, ProviderSuccess, ScriptHost, SessionConfig, WidgetError,
    WidgetEvent,
};
use storefront_checkout::notify::{CheckoutCallbacks, Notifier};
use storefront_checkout::types::{
    PaymentIntentRequest, PaymentOrderHandle, PaymentOrderResponse, Provider, VerificationReceipt,
    VerificationRequest,
};
use tokio::sync::Notify;
use url::Url;

pub fn order_response(order_id: &str, amount: Decimal, key: Option<&str>) -> PaymentOrderResponse {
    PaymentOrderResponse {
        payment_order_id: order_id.to_string(),
        provider: Provider::Razorpay,
        amount,
        currency: "INR".to_string(),
        key: key.map(str::to_string),
    }
}

pub fn order_not_found() -> ApiError {
    ApiError::from_response(
        404,
        Some(serde_json::json!({"error": "Order not found", "orderId": "ord_123"})),
    )
}

pub fn manager(config: CheckoutConfig) -> ConfigManager {
    ConfigManager::from_config(config).with_environment(HashMap::new())
}

pub fn default_manager() -> ConfigManager {
    manager(ConfigBuilder::new().build())
}

/// Scripted stand-in for the storefront backend.
#[derive(Default)]
pub struct FakeApi {
    create_results: Mutex<VecDeque<Result<PaymentOrderResponse, ApiError>>>,
    verify_result: Mutex<Option<Result<VerificationReceipt, ApiError>>>,
    create_requests: Mutex<Vec<PaymentIntentRequest>>,
    verify_requests: Mutex<Vec<VerificationRequest>>,
    create_delay: Mutex<Option<Duration>>,
    verify_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_create(&self, result: Result<PaymentOrderResponse, ApiError>) -> &Self {
        self.create_results.lock().unwrap().push_back(result);
        self
    }

    pub fn set_verify(&self, result: Result<VerificationReceipt, ApiError>) -> &Self {
        *self.verify_result.lock().unwrap() = Some(result);
        self
    }

    pub fn set_create_delay(&self, delay: Duration) -> &Self {
        *self.create_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Verification waits for `gate` before answering.
    pub fn gate_verify(&self, gate: Arc<Notify>) -> &Self {
        *self.verify_gate.lock().unwrap() = Some(gate);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_requests.lock().unwrap().len()
    }

    pub fn create_requests(&self) -> Vec<PaymentIntentRequest> {
        self.create_requests.lock().unwrap().clone()
    }

    pub fn verify_requests(&self) -> Vec<VerificationRequest> {
        self.verify_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentsApi for FakeApi {
    async fn create_payment_order(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentOrderResponse, ApiError> {
        self.create_requests.lock().unwrap().push(request.clone());
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.create_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::NetworkError("no scripted response".to_string())))
    }

    async fn verify_payment(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationReceipt, ApiError> {
        self.verify_requests.lock().unwrap().push(request.clone());
        let gate = self.verify_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.verify_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ApiError::NetworkError("no scripted response".to_string())))
    }
}

/// Hosted widget that replays scripted events.
#[derive(Default)]
pub struct FakeWidget {
    events: Mutex<VecDeque<Result<WidgetEvent, WidgetError>>>,
    configs: Mutex<Vec<SessionConfig>>,
    opened: Arc<Notify>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&self, event: Result<WidgetEvent, WidgetError>) -> &Self {
        self.events.lock().unwrap().push_back(event);
        self
    }

    /// Keeps the session open until `gate` is notified.
    pub fn hold_until(&self, gate: Arc<Notify>) -> &Self {
        *self.gate.lock().unwrap() = Some(gate);
        self
    }

    pub fn opened(&self) -> Arc<Notify> {
        self.opened.clone()
    }

    pub fn open_count(&self) -> usize {
        self.configs.lock().unwrap().len()
    }

    pub fn configs(&self) -> Vec<SessionConfig> {
        self.configs.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentWidget for FakeWidget {
    async fn open(&self, config: &SessionConfig) -> Result<WidgetEvent, WidgetError> {
        self.configs.lock().unwrap().push(config.clone());
        self.opened.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.events
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(WidgetEvent::Dismissed))
    }
}

pub fn provider_success(payment_id: &str, signature: &str) -> WidgetEvent {
    WidgetEvent::Success(ProviderSuccess {
        payment_id: payment_id.to_string(),
        provider_order_id: Some("po_1".to_string()),
        signature: signature.to_string(),
    })
}

pub fn provider_failure(description: Option<&str>) -> WidgetEvent {
    WidgetEvent::Failed(ProviderFailure {
        code: Some("BAD_REQUEST_ERROR".to_string()),
        description: description.map(str::to_string),
        reason: Some("payment_failed".to_string()),
    })
}

/// In-memory page for the script loader.
#[derive(Default)]
pub struct FakeHost {
    pub tag_present: AtomicBool,
    pub entry_present: AtomicBool,
    pub define_entry_on_load: AtomicBool,
    pub fail_load: AtomicBool,
    injections: AtomicUsize,
}

impl FakeHost {
    /// A page where injecting the script defines the entry point.
    pub fn loading_page() -> Self {
        let host = Self::default();
        host.define_entry_on_load.store(true, Ordering::SeqCst);
        host
    }

    pub fn injections(&self) -> usize {
        self.injections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptHost for FakeHost {
    fn has_script_tag(&self, _src: &Url) -> bool {
        self.tag_present.load(Ordering::SeqCst)
    }

    fn has_entry_point(&self) -> bool {
        self.entry_present.load(Ordering::SeqCst)
    }

    async fn inject_script(&self, _src: &Url) -> Result<(), String> {
        self.injections.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail_load.load(Ordering::SeqCst) {
            return Err("network error".to_string());
        }
        self.tag_present.store(true, Ordering::SeqCst);
        if self.define_entry_on_load.load(Ordering::SeqCst) {
            self.entry_present.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCallbacks {
    pub created: Mutex<Vec<PaymentOrderHandle>>,
    pub successes: AtomicUsize,
    pub failures: AtomicUsize,
}

impl RecordingCallbacks {
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn success_count(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

impl CheckoutCallbacks for RecordingCallbacks {
    fn on_payment_order_created(&self, handle: &PaymentOrderHandle) {
        self.created.lock().unwrap().push(handle.clone());
    }

    fn on_payment_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_payment_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Error(message) => Some(message),
                Notice::Success(_) => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push(Notice::Error(message.to_string()));
    }
}

//! reqwest client for the storefront payments endpoints.
use crate::api::{ApiError, PaymentsApi};
use crate::config::{ConfigError, ConfigManager};
use crate::types::{
    PaymentIntentRequest, PaymentOrderResponse, VerificationReceipt, VerificationRequest,
};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const CREATE_ORDER_PATH: &str = "payments/create-order/";
const VERIFY_PATH: &str = "payments/verify/";

/// JSON-over-HTTPS backend client.
///
/// # Examples
///
/// ```rust,ignore
/// use storefront_checkout::api::HttpPaymentsApi;
/// use storefront_checkout::config::ConfigManager;
///
/// let api = HttpPaymentsApi::from_config(&ConfigManager::new()?)?;
/// ```
pub struct HttpPaymentsApi {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpPaymentsApi {
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        // `Url::join` drops the last segment unless the base ends with a slash.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            ConfigError::InvalidConfig(format!("api.base_url `{}`: {}", base_url, e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    pub fn from_config(config_manager: &ConfigManager) -> Result<Self, ConfigError> {
        Self::new(
            &config_manager.get_api_base_url(),
            config_manager.get_auth_token(),
            Duration::from_secs(config_manager.get_config().api.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::NetworkError(format!("Invalid endpoint {}: {}", path, e)))?;
        let mut request = self.client.post(url.clone()).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        debug!(url = %url, "posting to payments backend");
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let payload = response.json::<serde_json::Value>().await.ok();
            let err = ApiError::from_response(status.as_u16(), payload);
            warn!(url = %url, status = status.as_u16(), error = %err, "payments backend returned an error");
            return Err(err);
        }
        response
            .json::<R>()
            .await
            .map_err(|e| ApiError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl PaymentsApi for HttpPaymentsApi {
    async fn create_payment_order(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentOrderResponse, ApiError> {
        self.post(CREATE_ORDER_PATH, request).await
    }

    async fn verify_payment(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationReceipt, ApiError> {
        self.post(VERIFY_PATH, request).await
    }
}

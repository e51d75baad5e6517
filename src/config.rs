//! Configuration module
use crate::types::PaymentMethod;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SCRIPT_URL: &str = "https://checkout.razorpay.com/v1/checkout.js";

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::SerializationError(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub api: ApiConfig,
    pub gateway: GatewayConfig,
    pub acquisition: AcquisitionConfig,
    pub storefront: StorefrontConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub script_url: String,
    pub settle_delay_ms: u64,
    pub theme_color: String,
    pub payment_methods: Vec<PaymentMethod>,
}

/// Timing of the create-order call: a grace delay, then fixed-delay retries
/// on "order not found".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    pub grace_period_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl AcquisitionConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    pub name: String,
    pub default_currency: String,
}

pub struct ConfigManager {
    config: CheckoutConfig,
    environment: HashMap<String, String>,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let manager = Self {
            config: Self::default_config(),
            environment: Self::load_environment_variables(),
        };
        manager.validate()?;
        Ok(manager)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        let config: CheckoutConfig = serde_json::from_str(&content)?;
        let manager = Self {
            config,
            environment: Self::load_environment_variables(),
        };
        manager.validate()?;
        Ok(manager)
    }

    pub fn from_config(config: CheckoutConfig) -> Self {
        Self {
            config,
            environment: Self::load_environment_variables(),
        }
    }

    /// Replaces the captured `CHECKOUT_*` environment.
    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = environment
            .into_iter()
            .filter(|(key, _)| key.starts_with("CHECKOUT_"))
            .collect();
        self
    }

    pub fn get_config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn get_api_base_url(&self) -> String {
        self.environment
            .get("CHECKOUT_API_BASE_URL")
            .cloned()
            .unwrap_or_else(|| self.config.api.base_url.clone())
    }

    pub fn get_auth_token(&self) -> Option<String> {
        self.environment
            .get("CHECKOUT_API_TOKEN")
            .cloned()
            .or_else(|| self.config.api.auth_token.clone())
    }

    pub fn get_script_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.config.gateway.script_url).map_err(|e| {
            ConfigError::InvalidConfig(format!(
                "gateway.script_url `{}`: {}",
                self.config.gateway.script_url, e
            ))
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.get_api_base_url();
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidConfig(format!("api.base_url `{}`: {}", base_url, e))
        })?;
        self.get_script_url()?;
        if self.config.storefront.default_currency.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "storefront.default_currency is empty".to_string(),
            ));
        }
        if self.config.acquisition.retry_delay_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "acquisition.retry_delay_ms must be positive".to_string(),
            ));
        }
        if self.config.gateway.payment_methods.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "gateway.payment_methods is empty".to_string(),
            ));
        }
        Ok(())
    }

    fn load_environment_variables() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("CHECKOUT_"))
            .collect()
    }

    fn default_config() -> CheckoutConfig {
        CheckoutConfig {
            api: ApiConfig {
                base_url: "http://localhost:8000/api/".to_string(),
                timeout_secs: 30,
                auth_token: None,
            },
            gateway: GatewayConfig {
                script_url: DEFAULT_SCRIPT_URL.to_string(),
                settle_delay_ms: 100,
                theme_color: "#1a1a1a".to_string(),
                payment_methods: PaymentMethod::all(),
            },
            acquisition: AcquisitionConfig {
                grace_period_ms: 500,
                max_retries: 3,
                retry_delay_ms: 1000,
            },
            storefront: StorefrontConfig {
                name: "Dolce Fiore".to_string(),
                default_currency: "INR".to_string(),
            },
        }
    }
}

pub struct ConfigBuilder {
    config: CheckoutConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigManager::default_config(),
        }
    }

    pub fn with_api_base_url(mut self, base_url: &str) -> Self {
        self.config.api.base_url = base_url.to_string();
        self
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.config.api.auth_token = Some(token.to_string());
        self
    }

    pub fn with_storefront_name(mut self, name: &str) -> Self {
        self.config.storefront.name = name.to_string();
        self
    }

    pub fn with_default_currency(mut self, currency: &str) -> Self {
        self.config.storefront.default_currency = currency.to_string();
        self
    }

    pub fn with_script_url(mut self, script_url: &str) -> Self {
        self.config.gateway.script_url = script_url.to_string();
        self
    }

    pub fn with_theme_color(mut self, color: &str) -> Self {
        self.config.gateway.theme_color = color.to_string();
        self
    }

    pub fn with_payment_methods(mut self, methods: Vec<PaymentMethod>) -> Self {
        self.config.gateway.payment_methods = methods;
        self
    }

    pub fn with_settle_delay(mut self, millis: u64) -> Self {
        self.config.gateway.settle_delay_ms = millis;
        self
    }

    pub fn with_grace_period(mut self, millis: u64) -> Self {
        self.config.acquisition.grace_period_ms = millis;
        self
    }

    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.config.acquisition.max_retries = max_retries;
        self.config.acquisition.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn build(self) -> CheckoutConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

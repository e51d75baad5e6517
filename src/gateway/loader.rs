//! Loads the provider's client library once per page.
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};
use url::Url;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayLoadError {
    #[error("Failed to load payment gateway script: {0}")]
    ScriptLoadFailed(String),
    #[error("Payment gateway SDK not available after script load")]
    EntryPointMissing,
}

impl GatewayLoadError {
    pub fn user_message(&self) -> String {
        match self {
            Self::ScriptLoadFailed(_) => {
                "Failed to load payment gateway SDK. Please refresh the page.".to_string()
            }
            Self::EntryPointMissing => {
                "Failed to initialize payment gateway SDK. Please refresh the page.".to_string()
            }
        }
    }
}

/// The page the library is loaded into.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Whether a script tag for `src` is already in the page.
    fn has_script_tag(&self, src: &Url) -> bool;

    /// Whether the library's global constructor is defined.
    fn has_entry_point(&self) -> bool;

    /// Adds a script tag for `src` and resolves when it has loaded.
    async fn inject_script(&self, src: &Url) -> Result<(), String>;
}

/// Page-wide readiness of the gateway library. Goes false to true at most once.
#[derive(Debug, Default)]
pub struct GatewayReadiness {
    ready: OnceCell<()>,
}

static GLOBAL_READINESS: OnceLock<Arc<GatewayReadiness>> = OnceLock::new();

impl GatewayReadiness {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance shared by every orchestrator.
    pub fn global() -> Arc<GatewayReadiness> {
        GLOBAL_READINESS
            .get_or_init(|| Arc::new(GatewayReadiness::new()))
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }
}

pub struct ScriptLoader {
    host: Arc<dyn ScriptHost>,
    readiness: Arc<GatewayReadiness>,
    script_url: Url,
    settle_delay: Duration,
}

impl ScriptLoader {
    pub fn new(
        host: Arc<dyn ScriptHost>,
        readiness: Arc<GatewayReadiness>,
        script_url: Url,
        settle_delay: Duration,
    ) -> Self {
        Self {
            host,
            readiness,
            script_url,
            settle_delay,
        }
    }

    pub fn readiness(&self) -> &Arc<GatewayReadiness> {
        &self.readiness
    }

    pub(crate) fn set_readiness(&mut self, readiness: Arc<GatewayReadiness>) {
        self.readiness = readiness;
    }

    /// Makes the library available, loading it only if the page lacks it.
    ///
    /// Concurrent callers share a single load. A failed load is not retried
    /// here; the page has to be reloaded.
    pub async fn ensure_ready(&self) -> Result<(), GatewayLoadError> {
        if self.readiness.is_ready() {
            return Ok(());
        }
        self.readiness
            .ready
            .get_or_try_init(|| self.load())
            .await
            .map(|_| ())
    }

    async fn load(&self) -> Result<(), GatewayLoadError> {
        if self.host.has_script_tag(&self.script_url) || self.host.has_entry_point() {
            debug!(src = %self.script_url, "payment gateway script already present");
            return Ok(());
        }

        info!(src = %self.script_url, "loading payment gateway script");
        if let Err(reason) = self.host.inject_script(&self.script_url).await {
            error!(src = %self.script_url, %reason, "failed to load payment gateway script");
            return Err(GatewayLoadError::ScriptLoadFailed(reason));
        }

        tokio::time::sleep(self.settle_delay).await;
        if !self.host.has_entry_point() {
            error!(src = %self.script_url, "payment gateway SDK not available after script load");
            return Err(GatewayLoadError::EntryPointMissing);
        }
        info!(src = %self.script_url, "payment gateway ready");
        Ok(())
    }
}

//! Runtime settings for discovery, probing and routing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::provider::{ConfigProvider, ConfigProviderExt};
use super::ConfigResult;

pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_VALIDATION_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_MAX_PROBE_CANDIDATES: usize = 16;
pub const DEFAULT_ROUTE: &str = "/home";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Root every plugin path is joined onto. `None` for hosts that only
    /// use an in-memory transport.
    pub base_url: Option<String>,
    /// Shared deadline for one batch of discovery probes.
    pub probe_timeout_ms: u64,
    /// Shared deadline for a validation pass over remembered names.
    pub validation_timeout_ms: u64,
    /// Hard cap on names probed in one batch.
    pub max_probe_candidates: usize,
    pub module_seeds: Vec<String>,
    pub service_seeds: Vec<String>,
    pub default_route: String,
    /// Document scanned for `#/<module>` links.
    pub entry_document: String,
    /// Script scanned for `services/<name>` imports.
    pub bootstrap_script: String,
    pub quiet_mode: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            validation_timeout_ms: DEFAULT_VALIDATION_TIMEOUT_MS,
            max_probe_candidates: DEFAULT_MAX_PROBE_CANDIDATES,
            module_seeds: ["home", "settings", "about", "dashboard"]
                .map(String::from)
                .to_vec(),
            service_seeds: ["theme", "storage", "api", "jsonImport", "discovery"]
                .map(String::from)
                .to_vec(),
            default_route: DEFAULT_ROUTE.to_string(),
            entry_document: "index.html".to_string(),
            bootstrap_script: "app.js".to_string(),
            quiet_mode: true,
        }
    }
}

impl RuntimeConfig {
    /// Reads a whole `runtime` object when present, then lets individual
    /// keys override single fields.
    pub async fn load(provider: &dyn ConfigProvider) -> ConfigResult<Self> {
        let mut config: Self = provider.get("runtime").await?.unwrap_or_default();

        if let Some(v) = provider.get("base_url").await? {
            config.base_url = Some(v);
        }
        if let Some(v) = provider.get("probe_timeout_ms").await? {
            config.probe_timeout_ms = v;
        }
        if let Some(v) = provider.get("validation_timeout_ms").await? {
            config.validation_timeout_ms = v;
        }
        if let Some(v) = provider.get("max_probe_candidates").await? {
            config.max_probe_candidates = v;
        }
        if let Some(v) = provider.get("module_seeds").await? {
            config.module_seeds = v;
        }
        if let Some(v) = provider.get("service_seeds").await? {
            config.service_seeds = v;
        }
        if let Some(v) = provider.get("default_route").await? {
            config.default_route = v;
        }
        if let Some(v) = provider.get("entry_document").await? {
            config.entry_document = v;
        }
        if let Some(v) = provider.get("bootstrap_script").await? {
            config.bootstrap_script = v;
        }
        if let Some(v) = provider.get("quiet_mode").await? {
            config.quiet_mode = v;
        }

        Ok(config)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_default_route(mut self, route: impl Into<String>) -> Self {
        self.default_route = route.into();
        self
    }

    pub fn with_quiet_mode(mut self, quiet: bool) -> Self {
        self.quiet_mode = quiet;
        self
    }
}

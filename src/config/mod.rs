//! Pluggable key/value configuration.
//!
//! The same provider abstraction backs runtime settings and the
//! persistent capability store.
//!
//! ```rust,no_run
//! use modhost::config::{ConfigBuilder, RuntimeConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ConfigBuilder::new()
//!     .env()
//!     .file("modhost.json")
//!     .build();
//! let config = RuntimeConfig::load(&provider).await?;
//! # Ok(())
//! # }
//! ```

pub mod composite;
pub mod env;
pub mod file;
pub mod memory;
pub mod provider;
pub mod runtime;

pub use composite::CompositeConfigProvider;
pub use env::{DEFAULT_ENV_PREFIX, EnvConfigProvider};
pub use file::FileConfigProvider;
pub use memory::MemoryConfigProvider;
pub use provider::{ConfigProvider, ConfigProviderExt};
pub use runtime::RuntimeConfig;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Provider '{provider}' is read-only")]
    ReadOnly { provider: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Assembles a [`CompositeConfigProvider`]; layers added first take priority.
#[derive(Default)]
pub struct ConfigBuilder {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `MODHOST_*` environment variables.
    pub fn env(mut self) -> Self {
        self.providers.push(Box::new(EnvConfigProvider::new()));
        self
    }

    pub fn env_with_prefix(mut self, prefix: &str) -> Self {
        self.providers
            .push(Box::new(EnvConfigProvider::prefixed(prefix)));
        self
    }

    pub fn file(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.providers
            .push(Box::new(FileConfigProvider::new(path.as_ref())));
        self
    }

    pub fn memory(mut self, provider: MemoryConfigProvider) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn provider(mut self, provider: Box<dyn ConfigProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn build(self) -> CompositeConfigProvider {
        let mut composite = CompositeConfigProvider::new();
        for provider in self.providers {
            composite.add_provider(provider);
        }
        composite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "probe_timeout_ms".to_string(),
            message: "expected u64".to_string(),
        };
        assert!(err.to_string().contains("probe_timeout_ms"));

        let err = ConfigError::ReadOnly {
            provider: "env".into(),
        };
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_builder_layer_order() {
        let composite = ConfigBuilder::new()
            .env()
            .memory(MemoryConfigProvider::named("defaults"))
            .build();
        assert_eq!(composite.provider_names(), vec!["env", "defaults"]);
    }
}

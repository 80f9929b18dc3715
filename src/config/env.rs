//! Read-only environment variable provider.

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult};

pub const DEFAULT_ENV_PREFIX: &str = "MODHOST_";

/// Maps `probe_timeout_ms` to `MODHOST_PROBE_TIMEOUT_MS` and
/// `discovery.base_url` to `MODHOST_DISCOVERY_BASE_URL`.
#[derive(Debug, Clone)]
pub struct EnvConfigProvider {
    prefix: String,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::prefixed(DEFAULT_ENV_PREFIX)
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn env_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase().replace('.', "_"))
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.env_key(key)) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }

    async fn set_raw(&self, _key: &str, _value: &str) -> ConfigResult<()> {
        Err(ConfigError::ReadOnly {
            provider: "env".into(),
        })
    }

    async fn delete(&self, _key: &str) -> ConfigResult<bool> {
        Err(ConfigError::ReadOnly {
            provider: "env".into(),
        })
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let env_prefix = self.env_key(prefix);
        Ok(std::env::vars()
            .filter_map(|(k, _)| {
                k.starts_with(&env_prefix).then(|| {
                    k[self.prefix.len()..].to_lowercase()
                })
            })
            .collect())
    }
}

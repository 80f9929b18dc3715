//! Key/value provider trait shared by runtime settings and the capability store.

use serde::{Serialize, de::DeserializeOwned};

use super::{ConfigError, ConfigResult};

/// Asynchronous string key/value surface.
///
/// Values are stored as raw strings; typed access goes through
/// [`ConfigProviderExt`], which encodes values as JSON.
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: &str) -> ConfigResult<()>;

    /// Returns `true` when the key existed.
    async fn delete(&self, key: &str) -> ConfigResult<bool>;

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>>;
}

/// Typed helpers layered over [`ConfigProvider`].
pub trait ConfigProviderExt: ConfigProvider {
    fn get<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        Self: Sync,
    {
        async move {
            let Some(raw) = self.get_raw(key).await? else {
                return Ok(None);
            };
            // Providers may hand back bare strings that were never JSON-encoded.
            serde_json::from_str(&raw)
                .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.clone())))
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
    }

    fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> impl std::future::Future<Output = ConfigResult<()>> + Send
    where
        Self: Sync,
    {
        async move {
            let raw = serde_json::to_string(value)?;
            self.set_raw(key, &raw).await
        }
    }

    /// Reads a typed value, falling back to `default` when the key is absent.
    fn get_or<T: DeserializeOwned + Send>(
        &self,
        key: &str,
        default: T,
    ) -> impl std::future::Future<Output = ConfigResult<T>> + Send
    where
        Self: Sync,
    {
        async move { Ok(self.get(key).await?.unwrap_or(default)) }
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProviderExt for P {}

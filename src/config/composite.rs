//! Layered provider: the first layer holding a key wins.

use super::ConfigResult;
use super::provider::ConfigProvider;

#[derive(Default)]
pub struct CompositeConfigProvider {
    layers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer below the existing ones.
    pub fn add_provider(&mut self, provider: Box<dyn ConfigProvider>) {
        self.layers.push(provider);
    }

    pub fn provider(mut self, provider: Box<dyn ConfigProvider>) -> Self {
        self.add_provider(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.layers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for CompositeConfigProvider {
    fn name(&self) -> &str {
        "composite"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        for layer in &self.layers {
            if let Some(value) = layer.get_raw(key).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Writes go to the first layer that accepts them; read-only layers
    /// such as the environment are skipped.
    async fn set_raw(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut last_err = None;
        for layer in &self.layers {
            match layer.set_raw(key, value).await {
                Ok(()) => return Ok(()),
                Err(e) => last_err = Some(e),
            }
        }
        last_err.map_or(Ok(()), Err)
    }

    async fn delete(&self, key: &str) -> ConfigResult<bool> {
        let mut deleted = false;
        for layer in &self.layers {
            // read-only layers cannot hold deletable keys
            if let Ok(true) = layer.delete(key).await {
                deleted = true;
            }
        }
        Ok(deleted)
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let mut keys = std::collections::BTreeSet::new();
        for layer in &self.layers {
            keys.extend(layer.list_keys(prefix).await?);
        }
        Ok(keys.into_iter().collect())
    }
}

impl std::fmt::Debug for CompositeConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeConfigProvider")
            .field("layers", &self.provider_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvConfigProvider, MemoryConfigProvider};

    #[tokio::test]
    async fn test_first_layer_wins() {
        let high = MemoryConfigProvider::with_entries([("default_route", "/dashboard")]);
        let low = MemoryConfigProvider::with_entries([
            ("default_route", "/home"),
            ("entry_document", "index.html"),
        ]);

        let composite = CompositeConfigProvider::new()
            .provider(Box::new(high))
            .provider(Box::new(low));

        assert_eq!(
            composite.get_raw("default_route").await.unwrap().as_deref(),
            Some("/dashboard")
        );
        assert_eq!(
            composite.get_raw("entry_document").await.unwrap().as_deref(),
            Some("index.html")
        );
        assert_eq!(composite.get_raw("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writes_skip_read_only_layers() {
        let memory = MemoryConfigProvider::new();
        let composite = CompositeConfigProvider::new()
            .provider(Box::new(EnvConfigProvider::prefixed("MODHOST_COMPOSITE_TEST_")))
            .provider(Box::new(memory.clone()));

        composite.set_raw("key", "value").await.unwrap();
        assert_eq!(memory.get_raw("key").await.unwrap().as_deref(), Some("value"));
        assert!(composite.delete("key").await.unwrap());
    }
}

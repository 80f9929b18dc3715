//! Persistent memory of discovered names, backed by any config provider.
//!
//! Every failure here is logged and read as "absent": a broken store never
//! stops discovery.

use std::sync::Arc;

use crate::config::{ConfigProvider, ConfigProviderExt, MemoryConfigProvider};
use crate::plugins::PluginKind;

pub const MODULES_KEY: &str = "app_discoveredModules";
pub const SERVICES_KEY: &str = "app_discoveredServices";
pub const QUIET_MODE_KEY: &str = "app_discoveryQuietMode";

/// Reads and writes the remembered name lists and the quiet-mode flag.
#[derive(Clone)]
pub struct CapabilityStore {
    provider: Arc<dyn ConfigProvider>,
}

impl CapabilityStore {
    /// Create a new store on top of `provider`.
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self { provider }
    }

    /// Session-only store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConfigProvider::named("capabilities")))
    }

    /// Get the storage key holding the name list for `kind`.
    pub fn key(kind: PluginKind) -> &'static str {
        match kind {
            PluginKind::Module => MODULES_KEY,
            PluginKind::Service => SERVICES_KEY,
        }
    }

    /// Get the backing provider.
    pub fn provider(&self) -> &Arc<dyn ConfigProvider> {
        &self.provider
    }

    /// Remembered names for `kind`, or `None` when nothing usable is stored.
    pub async fn load_names(&self, kind: PluginKind) -> Option<Vec<String>> {
        let key = Self::key(kind);
        match self.provider.get::<Vec<String>>(key).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    key,
                    error = %e,
                    "Ignoring unreadable capability entry"
                );
                None
            }
        }
    }

    /// Replace the remembered names for `kind`. Returns `false` when the
    /// write did not go through.
    pub async fn save_names(&self, kind: PluginKind, names: &[String]) -> bool {
        let key = Self::key(kind);
        match self.provider.set(key, &names).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    key,
                    error = %e,
                    "Failed to persist discovered names"
                );
                false
            }
        }
    }

    /// Get the persisted quiet-mode flag, if one was ever saved.
    pub async fn quiet_mode(&self) -> Option<bool> {
        match self.provider.get::<bool>(QUIET_MODE_KEY).await {
            Ok(quiet) => quiet,
            Err(e) => {
                tracing::warn!(key = QUIET_MODE_KEY, error = %e, "Ignoring unreadable quiet mode");
                None
            }
        }
    }

    /// Persist the quiet-mode flag.
    pub async fn set_quiet_mode(&self, quiet: bool) -> bool {
        match self.provider.set(QUIET_MODE_KEY, &quiet).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = QUIET_MODE_KEY, error = %e, "Failed to persist quiet mode");
                false
            }
        }
    }

    /// Forgets both name lists. Quiet mode is kept.
    pub async fn clear(&self) {
        for kind in PluginKind::ALL {
            if let Err(e) = self.provider.delete(Self::key(kind)).await {
                tracing::warn!(key = Self::key(kind), error = %e, "Failed to clear capability entry");
            }
        }
    }
}

impl std::fmt::Debug for CapabilityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityStore")
            .field("provider", &self.provider.name())
            .finish()
    }
}

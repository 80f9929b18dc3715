use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::discovery::DiscoveryEngine;
use crate::loader::Resolution;
use crate::plugins::Service;
use crate::registry::ServiceRegistry;
use crate::transport::Transport;

/// Everything a booted runtime shares with its host, passed explicitly
/// instead of living in globals.
#[derive(Clone)]
pub struct RuntimeContext {
    config: RuntimeConfig,
    transport: Arc<dyn Transport>,
    discovery: Arc<DiscoveryEngine>,
    services: ServiceRegistry,
}

impl RuntimeContext {
    pub(crate) fn new(
        config: RuntimeConfig,
        transport: Arc<dyn Transport>,
        discovery: Arc<DiscoveryEngine>,
        services: ServiceRegistry,
    ) -> Self {
        Self {
            config,
            transport,
            discovery,
            services,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn discovery(&self) -> &Arc<DiscoveryEngine> {
        &self.discovery
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn service<T: Service>(&self, name: &str) -> Option<&T> {
        self.services.get_as::<T>(name)
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("config", &self.config)
            .field("services", &self.services.names())
            .finish_non_exhaustive()
    }
}

/// What one boot produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootReport {
    pub services: Vec<String>,
    pub modules: Vec<String>,
    pub resolution: Resolution,
}

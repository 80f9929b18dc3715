//! Compiled-in plugin factories, keyed by discovered name.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Module, PluginError, PluginKind, Service};
use crate::registry::ServiceRegistry;

/// Builds a service. Receives the services already loaded, which include
/// every declared dependency that loaded successfully.
pub type ServiceFactory =
    Arc<dyn Fn(&ServiceRegistry) -> Result<Arc<dyn Service>, PluginError> + Send + Sync>;
/// Builds a module. Receives the full service registry.
pub type ModuleFactory =
    Arc<dyn Fn(&ServiceRegistry) -> Result<Box<dyn Module>, PluginError> + Send + Sync>;

/// Maps plugin names to constructors. A discovered name without an entry
/// here fails to load; the rest of the stage carries on.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    services: HashMap<String, ServiceFactory>,
    modules: HashMap<String, ModuleFactory>,
}

impl PluginCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service factory under `name`.
    pub fn service<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ServiceRegistry) -> Result<Arc<dyn Service>, PluginError> + Send + Sync + 'static,
    {
        self.services.insert(name.into(), Arc::new(factory));
        self
    }

    /// The same instance is handed out on every load.
    pub fn service_instance(self, name: impl Into<String>, instance: Arc<dyn Service>) -> Self {
        self.service(name, move |_| Ok(Arc::clone(&instance)))
    }

    /// Register `S::default()` under `name`.
    pub fn service_default<S>(self, name: impl Into<String>) -> Self
    where
        S: Service + Default,
    {
        self.service(name, |_| Ok(Arc::new(S::default()) as Arc<dyn Service>))
    }

    /// Register a module factory under `name`.
    pub fn module<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ServiceRegistry) -> Result<Box<dyn Module>, PluginError> + Send + Sync + 'static,
    {
        self.modules.insert(name.into(), Arc::new(factory));
        self
    }

    /// Register `M::default()` under `name`.
    pub fn module_default<M>(self, name: impl Into<String>) -> Self
    where
        M: Module + Default + 'static,
    {
        self.module(name, |_| Ok(Box::new(M::default()) as Box<dyn Module>))
    }

    /// In-place form of [`service_instance`](Self::service_instance).
    pub fn register_service_instance(&mut self, name: impl Into<String>, instance: Arc<dyn Service>) {
        self.services
            .insert(name.into(), Arc::new(move |_: &ServiceRegistry| Ok(Arc::clone(&instance))));
    }

    /// Get the factory registered for service `name`.
    pub fn service_factory(&self, name: &str) -> Option<&ServiceFactory> {
        self.services.get(name)
    }

    /// Get the factory registered for module `name`.
    pub fn module_factory(&self, name: &str) -> Option<&ModuleFactory> {
        self.modules.get(name)
    }

    /// Whether a factory of `kind` is registered under `name`.
    pub fn contains(&self, kind: PluginKind, name: &str) -> bool {
        match kind {
            PluginKind::Service => self.services.contains_key(name),
            PluginKind::Module => self.modules.contains_key(name),
        }
    }

    /// Registered names of `kind`, sorted.
    pub fn names(&self, kind: PluginKind) -> Vec<&str> {
        let mut names: Vec<&str> = match kind {
            PluginKind::Service => self.services.keys().map(String::as_str).collect(),
            PluginKind::Module => self.modules.keys().map(String::as_str).collect(),
        };
        names.sort_unstable();
        names
    }

    /// Runs a service factory, turning a panic into an error.
    pub(crate) fn instantiate_service(
        &self,
        name: &str,
        registry: &ServiceRegistry,
    ) -> Result<Arc<dyn Service>, PluginError> {
        let factory = self
            .service_factory(name)
            .ok_or_else(|| PluginError::MissingFactory {
                kind: PluginKind::Service,
                name: name.to_string(),
            })?;
        guard(PluginKind::Service, name, || factory(registry))
    }

    pub(crate) fn instantiate_module(
        &self,
        name: &str,
        registry: &ServiceRegistry,
    ) -> Result<Box<dyn Module>, PluginError> {
        let factory = self
            .module_factory(name)
            .ok_or_else(|| PluginError::MissingFactory {
                kind: PluginKind::Module,
                name: name.to_string(),
            })?;
        guard(PluginKind::Module, name, || factory(registry))
    }
}

fn guard<T>(
    kind: PluginKind,
    name: &str,
    f: impl FnOnce() -> Result<T, PluginError>,
) -> Result<T, PluginError> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).unwrap_or_else(
        |payload: Box<dyn Any + Send>| {
            Err(PluginError::instantiate(
                kind,
                name,
                super::error::panic_message(payload.as_ref()),
            ))
        },
    )
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("services", &self.names(PluginKind::Service))
            .field("modules", &self.names(PluginKind::Module))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Theme;

    #[async_trait]
    impl Service for Theme {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct Home;
    impl Module for Home {}

    #[test]
    fn test_lookup_by_kind() {
        let catalog = PluginCatalog::new()
            .service_default::<Theme>("theme")
            .module_default::<Home>("home");

        assert!(catalog.contains(PluginKind::Service, "theme"));
        assert!(!catalog.contains(PluginKind::Module, "theme"));
        assert!(catalog.contains(PluginKind::Module, "home"));
        assert_eq!(catalog.names(PluginKind::Service), vec!["theme"]);
    }

    #[test]
    fn test_missing_factory() {
        let catalog = PluginCatalog::new();
        let err = catalog.instantiate_service("api", &ServiceRegistry::new()).err().unwrap();
        assert!(matches!(err, PluginError::MissingFactory { kind: PluginKind::Service, .. }));
    }

    #[test]
    fn test_factory_panic_becomes_error() {
        let catalog = PluginCatalog::new().module("broken", |_| panic!("template engine exploded"));
        let registry = ServiceRegistry::new();
        let err = catalog.instantiate_module("broken", &registry).err().unwrap();
        match err {
            PluginError::Instantiate { name, message, .. } => {
                assert_eq!(name, "broken");
                assert!(message.contains("template engine exploded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_service_instance_is_shared() {
        let shared: Arc<dyn Service> = Arc::new(Theme);
        let catalog = PluginCatalog::new().service_instance("theme", Arc::clone(&shared));
        let registry = ServiceRegistry::new();
        let a = catalog.instantiate_service("theme", &registry).unwrap();
        let b = catalog.instantiate_service("theme", &registry).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

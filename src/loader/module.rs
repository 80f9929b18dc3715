//! Instantiates modules whose required services are all present.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::discovery::DiscoveryEngine;
use crate::plugins::{
    DescriptorSet, Module, PluginCatalog, PluginDescriptor, PluginKind, capitalize,
};
use crate::registry::ServiceRegistry;

/// A loaded module with its resolved display metadata.
pub struct LoadedModule {
    name: String,
    instance: Box<dyn Module>,
    descriptor: Arc<PluginDescriptor>,
    title: String,
    nav_item: bool,
}

impl LoadedModule {
    /// Instance values win over the descriptor; the title falls back to the
    /// capitalized name and `nav_item` to `true`.
    pub fn new(instance: Box<dyn Module>, descriptor: Arc<PluginDescriptor>) -> Self {
        let name = descriptor.name.clone();
        let title = instance
            .title()
            .map(str::to_string)
            .or_else(|| descriptor.title.clone())
            .unwrap_or_else(|| capitalize(&name));
        let nav_item = instance
            .nav_item()
            .or(descriptor.nav_item)
            .unwrap_or(true);
        Self {
            name,
            instance,
            descriptor,
            title,
            nav_item,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn nav_item(&self) -> bool {
        self.nav_item
    }

    pub fn nav_order(&self) -> Option<f64> {
        self.descriptor.nav_order
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn instance(&self) -> &dyn Module {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> &mut dyn Module {
        self.instance.as_mut()
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("nav_item", &self.nav_item)
            .finish_non_exhaustive()
    }
}

/// Loaded modules keyed by name, in load order.
#[derive(Debug, Default)]
pub struct LoadedModules {
    entries: Vec<LoadedModule>,
    index: HashMap<String, usize>,
}

impl LoadedModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and keeps the existing entry on a duplicate name.
    pub fn insert(&mut self, module: LoadedModule) -> bool {
        if self.index.contains_key(module.name()) {
            return false;
        }
        self.index.insert(module.name().to_string(), self.entries.len());
        self.entries.push(module);
        true
    }

    pub fn get(&self, name: &str) -> Option<&LoadedModule> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LoadedModule> {
        self.index.get(name).map(|&i| &mut self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(LoadedModule::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedModule> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ModuleLoader<'a> {
    catalog: &'a PluginCatalog,
    services: &'a ServiceRegistry,
    discovery: Option<&'a DiscoveryEngine>,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(catalog: &'a PluginCatalog, services: &'a ServiceRegistry) -> Self {
        Self {
            catalog,
            services,
            discovery: None,
        }
    }

    /// Loaded modules are also recorded as discovered.
    pub fn with_discovery(mut self, discovery: Option<&'a DiscoveryEngine>) -> Self {
        self.discovery = discovery;
        self
    }

    /// Each module is independent: one that lacks services or fails to
    /// instantiate is logged and skipped.
    pub async fn load(&self, descriptors: &DescriptorSet) -> LoadedModules {
        let mut modules = LoadedModules::new();

        for descriptor in descriptors.iter() {
            let name = descriptor.name.as_str();

            let missing = self.services.missing(&descriptor.required_services);
            if !missing.is_empty() {
                tracing::warn!(module = name, missing = ?missing, "Skipping module, required services unavailable");
                continue;
            }

            let instance = match self.catalog.instantiate_module(name, self.services) {
                Ok(instance) => instance,
                Err(e) => {
                    tracing::warn!(module = name, error = %e, "Failed to load module");
                    continue;
                }
            };

            if modules.insert(LoadedModule::new(instance, Arc::clone(descriptor))) {
                tracing::debug!(module = name, "Module loaded");
                if let Some(discovery) = self.discovery {
                    discovery.add_discovered(PluginKind::Module, name).await;
                }
            }
        }

        modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    use async_trait::async_trait;

    use crate::config::RuntimeConfig;
    use crate::discovery::{CapabilityStore, ScriptedProber};
    use crate::plugins::{PluginError, Service};
    use crate::registry::ServiceEntry;
    use crate::transport::StaticTransport;

    struct Api;

    #[async_trait]
    impl Service for Api {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct Plain;
    impl Module for Plain {}

    struct Titled;
    impl Module for Titled {
        fn title(&self) -> Option<&str> {
            Some("Custom Title")
        }

        fn nav_item(&self) -> Option<bool> {
            Some(false)
        }
    }

    fn registry_with(names: &[&str]) -> ServiceRegistry {
        let mut registry = ServiceRegistry::new();
        for name in names {
            registry
                .register(ServiceEntry::new(
                    Arc::new(PluginDescriptor::new(*name)),
                    Arc::new(Api),
                ))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_metadata_precedence() {
        let descriptor = Arc::new(
            PluginDescriptor::new("reports")
                .with_title("Reports")
                .with_nav(true, Some(2.0)),
        );
        let from_instance = LoadedModule::new(Box::new(Titled), Arc::clone(&descriptor));
        assert_eq!(from_instance.title(), "Custom Title");
        assert!(!from_instance.nav_item());

        let from_descriptor = LoadedModule::new(Box::new(Plain), descriptor);
        assert_eq!(from_descriptor.title(), "Reports");
        assert_eq!(from_descriptor.nav_order(), Some(2.0));

        let bare = LoadedModule::new(Box::new(Plain), Arc::new(PluginDescriptor::new("about")));
        assert_eq!(bare.title(), "About");
        assert!(bare.nav_item());
    }

    #[tokio::test]
    async fn test_required_services_gate_loading() {
        let catalog = PluginCatalog::new()
            .module_default::<Plain>("home")
            .module_default::<Plain>("reports");
        let services = registry_with(&["storage"]);
        let descriptors: DescriptorSet = [
            PluginDescriptor::new("home").with_required_services(["storage"]),
            PluginDescriptor::new("reports").with_required_services(["storage", "api"]),
        ]
        .into_iter()
        .collect();

        let modules = ModuleLoader::new(&catalog, &services).load(&descriptors).await;
        assert_eq!(modules.names(), vec!["home"]);
    }

    #[tokio::test]
    async fn test_factory_failures_are_isolated() {
        let catalog = PluginCatalog::new()
            .module_default::<Plain>("home")
            .module("broken", |_| {
                Err(PluginError::instantiate(PluginKind::Module, "broken", "bad markup"))
            })
            .module("settings", |services| {
                if services.contains("api") {
                    Ok(Box::new(Plain) as Box<dyn Module>)
                } else {
                    Err(PluginError::instantiate(PluginKind::Module, "settings", "no api"))
                }
            });
        let services = registry_with(&["api"]);
        let descriptors: DescriptorSet = ["broken", "home", "ghost", "settings"]
            .into_iter()
            .map(PluginDescriptor::new)
            .collect();

        let modules = ModuleLoader::new(&catalog, &services).load(&descriptors).await;
        assert_eq!(modules.names(), vec!["home", "settings"]);
    }

    #[tokio::test]
    async fn test_loaded_modules_recorded_as_discovered() {
        let engine = DiscoveryEngine::new(
            CapabilityStore::in_memory(),
            Arc::new(ScriptedProber::new()),
            Arc::new(StaticTransport::new()),
            RuntimeConfig::default(),
        );
        let catalog = PluginCatalog::new().module_default::<Plain>("reports");
        let services = ServiceRegistry::new();
        let descriptors: DescriptorSet = [PluginDescriptor::new("reports")].into_iter().collect();

        ModuleLoader::new(&catalog, &services)
            .with_discovery(Some(&engine))
            .load(&descriptors)
            .await;
        assert_eq!(engine.discovered(PluginKind::Module).await, vec!["reports"]);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut modules = LoadedModules::new();
        let descriptor = Arc::new(PluginDescriptor::new("home"));
        assert!(modules.insert(LoadedModule::new(Box::new(Plain), Arc::clone(&descriptor))));
        assert!(!modules.insert(LoadedModule::new(Box::new(Titled), descriptor)));
        assert_eq!(modules.get("home").unwrap().title(), "Home");
    }
}

//! Instantiates and initializes services in resolved order.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::plugins::{PluginCatalog, PluginDescriptor, PluginError, panic_message};
use crate::registry::{ServiceEntry, ServiceRegistry};

/// Builds the [`ServiceRegistry`] for one boot.
pub struct ServiceLoader<'a> {
    catalog: &'a PluginCatalog,
}

impl<'a> ServiceLoader<'a> {
    /// Create a new loader drawing factories from `catalog`.
    pub fn new(catalog: &'a PluginCatalog) -> Self {
        Self { catalog }
    }

    /// Loads `order` one service at a time, each `init` completing before
    /// the next service starts. Each factory sees the services loaded before
    /// it. A failing service is logged and left out; the rest still load.
    pub async fn load(
        &self,
        order: &[String],
        descriptors: &crate::plugins::DescriptorSet,
    ) -> ServiceRegistry {
        let mut registry = ServiceRegistry::new();

        for name in order {
            let Some(descriptor) = descriptors.get(name) else {
                tracing::warn!(service = %name, "No descriptor for ordered service");
                continue;
            };

            match self.load_one(&registry, descriptor).await {
                Ok(entry) => {
                    if let Err(e) = registry.register(entry) {
                        tracing::warn!(service = %name, error = %e, "Service registration failed");
                    } else {
                        tracing::debug!(service = %name, "Service loaded");
                    }
                }
                Err(e) => {
                    tracing::warn!(service = %name, error = %e, "Failed to load service");
                }
            }
        }

        registry
    }

    async fn load_one(
        &self,
        loaded: &ServiceRegistry,
        descriptor: &Arc<PluginDescriptor>,
    ) -> Result<ServiceEntry, PluginError> {
        let name = descriptor.name.as_str();
        let instance = self.catalog.instantiate_service(name, loaded)?;

        let init = AssertUnwindSafe(instance.init(&descriptor.config))
            .catch_unwind()
            .await;
        match init {
            Ok(Ok(())) => Ok(ServiceEntry::new(Arc::clone(descriptor), instance)),
            Ok(Err(e)) => Err(PluginError::Init {
                name: name.to_string(),
                message: e.to_string(),
            }),
            Err(payload) => Err(PluginError::Init {
                name: name.to_string(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use crate::plugins::{DescriptorSet, PluginKind, Service};

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Service for Recording {
        fn as_any(&self) -> &dyn Any {
            self
        }

        async fn init(&self, config: &Value) -> crate::Result<()> {
            tokio::task::yield_now().await;
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, config));
            if self.fail {
                return Err(crate::Error::Config(format!("{} refused", self.name)));
            }
            Ok(())
        }
    }

    fn catalog(log: &Arc<Mutex<Vec<String>>>, failing: &[&'static str]) -> PluginCatalog {
        let mut catalog = PluginCatalog::new();
        for name in ["storage", "theme", "api"] {
            let log = Arc::clone(log);
            let fail = failing.contains(&name);
            catalog = catalog.service(name, move |_| {
                Ok(Arc::new(Recording {
                    name,
                    log: Arc::clone(&log),
                    fail,
                }) as Arc<dyn Service>)
            });
        }
        catalog.service("exploding", |_| panic!("constructor blew up"))
    }

    fn descriptors(names: &[&str]) -> DescriptorSet {
        names.iter().map(|n| PluginDescriptor::new(*n)).collect()
    }

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_init_runs_sequentially_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let catalog = catalog(&log, &[]);
        let mut set = descriptors(&["theme", "api"]);
        set.insert(PluginDescriptor::new("storage").with_config(json!({"prefix": "app_"})));

        let registry = ServiceLoader::new(&catalog)
            .load(&order(&["storage", "theme", "api"]), &set)
            .await;

        assert_eq!(registry.names(), vec!["storage", "theme", "api"]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![r#"storage:{"prefix":"app_"}"#, "theme:{}", "api:{}"]
        );
    }

    #[tokio::test]
    async fn test_factory_sees_earlier_services() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_factory = Arc::clone(&seen);
        let catalog = catalog(&log, &[]).service("reports", move |services| {
            seen_by_factory
                .lock()
                .unwrap()
                .extend(services.names().iter().map(|n| n.to_string()));
            services
                .get("storage")
                .map(|entry| Arc::clone(entry.instance()))
                .ok_or_else(|| PluginError::instantiate(PluginKind::Service, "reports", "storage not loaded"))
        });

        let names = ["storage", "theme", "reports"];
        let registry = ServiceLoader::new(&catalog)
            .load(&order(&names), &descriptors(&names))
            .await;

        assert_eq!(registry.names(), vec!["storage", "theme", "reports"]);
        assert_eq!(*seen.lock().unwrap(), vec!["storage", "theme"]);
        assert!(Arc::ptr_eq(
            registry.get("reports").unwrap().instance(),
            registry.get("storage").unwrap().instance()
        ));
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let catalog = catalog(&log, &["theme"]);
        let set = descriptors(&["storage", "theme", "exploding", "missing", "api"]);

        let registry = ServiceLoader::new(&catalog)
            .load(&order(&["storage", "theme", "exploding", "missing", "api"]), &set)
            .await;

        assert_eq!(registry.names(), vec!["storage", "api"]);
        assert!(registry.get("theme").is_none());
    }

    #[tokio::test]
    async fn test_init_panic_is_isolated() {
        struct Panicky;

        #[async_trait]
        impl Service for Panicky {
            fn as_any(&self) -> &dyn Any {
                self
            }

            async fn init(&self, _config: &Value) -> crate::Result<()> {
                panic!("init panicked");
            }
        }

        let catalog = PluginCatalog::new()
            .service("panicky", |_| Ok(Arc::new(Panicky) as Arc<dyn Service>));
        let registry = ServiceLoader::new(&catalog)
            .load(&order(&["panicky"]), &descriptors(&["panicky"]))
            .await;
        assert!(registry.is_empty());
    }
}

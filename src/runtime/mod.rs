//! Boot orchestration.
//!
//! One boot runs four stages in order:
//!
//! 1. discovery initializes (remembered names are loaded and re-validated)
//! 2. services are discovered, ordered by dependency, instantiated and
//!    initialized one at a time
//! 3. modules are discovered and loaded when their required services exist
//! 4. the router is built over whatever modules loaded
//!
//! Individual plugin failures never abort a boot. Only a boot that ends with
//! zero modules produces the application error view.

mod context;
mod shell;

pub use context::{BootReport, RuntimeContext};
pub use shell::{APP_ERROR_MESSAGE, Shell, ShellView};

use std::sync::Arc;

use tracing::Instrument;

use crate::config::{ConfigProvider, FileConfigProvider, RuntimeConfig};
use crate::discovery::{ArtifactProber, CapabilityStore, DISCOVERY_SERVICE, DiscoveryEngine, Prober};
use crate::loader::{DependencyResolver, ModuleLoader, ServiceLoader};
use crate::observability::{SpanContext, Stage, StageSpan};
use crate::plugins::{DescriptorSource, PluginCatalog, PluginKind, Service};
use crate::router::Router;
use crate::transport::{HttpTransport, Transport};
use crate::{Error, Result};

pub struct Runtime {
    config: RuntimeConfig,
    transport: Arc<dyn Transport>,
    store: CapabilityStore,
    prober: Arc<dyn Prober>,
    catalog: PluginCatalog,
    spans: SpanContext,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn store(&self) -> &CapabilityStore {
        &self.store
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    pub async fn boot(&self) -> Shell {
        let span = self.spans.boot_span();
        self.boot_stages().instrument(span).await
    }

    /// Boots and mounts `location`.
    pub async fn start(&self, location: &str) -> Shell {
        let mut shell = self.boot().await;
        shell.start(location).await;
        shell
    }

    /// Tears `shell` down and boots again, returning to the location it
    /// was showing.
    pub async fn refresh(&self, shell: Shell) -> Shell {
        let location = shell.shutdown();
        tracing::info!(location = ?location, "Refreshing runtime");
        self.start(location.as_deref().unwrap_or("")).await
    }

    async fn boot_stages(&self) -> Shell {
        let discovery = Arc::new(DiscoveryEngine::new(
            self.store.clone(),
            Arc::clone(&self.prober),
            Arc::clone(&self.transport),
            self.config.clone(),
        ));

        let stage = StageSpan::new(Stage::Discovery);
        discovery.init().instrument(stage.span().clone()).await;
        let remembered = discovery.discovered(PluginKind::Module).await.len()
            + discovery.discovered(PluginKind::Service).await.len();
        stage.finish(remembered);

        let mut catalog = self.catalog.clone();
        catalog.register_service_instance(
            DISCOVERY_SERVICE,
            Arc::clone(&discovery) as Arc<dyn Service>,
        );
        let source = DescriptorSource::new(Arc::clone(&self.transport));

        let stage = StageSpan::new(Stage::Services);
        let (services, resolution) = async {
            let names = discovery.discover_names(PluginKind::Service).await;
            let descriptors = source.load_all(PluginKind::Service, &names).await;
            let resolution = DependencyResolver::new().resolve(&descriptors);
            let services = ServiceLoader::new(&catalog)
                .load(&resolution.order, &descriptors)
                .await;
            (services, resolution)
        }
        .instrument(stage.span().clone())
        .await;
        stage.finish(services.len());

        let stage = StageSpan::new(Stage::Modules);
        let engine_active = services.contains(DISCOVERY_SERVICE);
        let modules = async {
            if engine_active {
                discovery.discover_new(PluginKind::Module).await;
            }
            let names = discovery.discover_names(PluginKind::Module).await;
            let descriptors = source.load_all(PluginKind::Module, &names).await;
            ModuleLoader::new(&catalog, &services)
                .with_discovery(engine_active.then_some(discovery.as_ref()))
                .load(&descriptors)
                .await
        }
        .instrument(stage.span().clone())
        .await;
        stage.finish(modules.len());

        let stage = StageSpan::new(Stage::Router);
        let report = BootReport {
            services: services.names().into_iter().map(String::from).collect(),
            modules: modules.names().into_iter().map(String::from).collect(),
            resolution,
        };
        let router = Router::new(modules, Arc::clone(&self.transport), &self.config.default_route);
        stage.finish(router.nav().entries().len());

        tracing::info!(
            services = report.services.len(),
            modules = report.modules.len(),
            "Runtime booted"
        );

        let context = RuntimeContext::new(
            self.config.clone(),
            Arc::clone(&self.transport),
            discovery,
            services,
        );
        Shell::new(context, router, report)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct RuntimeBuilder {
    config: Option<RuntimeConfig>,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn ConfigProvider>>,
    prober: Option<Arc<dyn Prober>>,
    catalog: PluginCatalog,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Reads [`RuntimeConfig`] from `provider`.
    pub async fn config_from(mut self, provider: &dyn ConfigProvider) -> Result<Self> {
        self.config = Some(RuntimeConfig::load(provider).await?);
        Ok(self)
    }

    /// Defaults to an [`HttpTransport`] over `base_url`.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Provider backing the capability store. Defaults to a JSON file in
    /// the platform data directory.
    pub fn store(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.store = Some(provider);
        self
    }

    /// Defaults to an [`ArtifactProber`] over the transport.
    pub fn prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn build(self) -> Result<Runtime> {
        let config = self.config.unwrap_or_default();

        let transport: Arc<dyn Transport> = match (self.transport, config.base_url.as_deref()) {
            (Some(transport), _) => transport,
            (None, Some(base_url)) => Arc::new(HttpTransport::new(base_url)?),
            (None, None) => {
                return Err(Error::Config(
                    "no transport: set base_url or provide one".to_string(),
                ));
            }
        };

        let store = match self.store {
            Some(provider) => CapabilityStore::new(provider),
            None => match FileConfigProvider::default_path() {
                Some(path) => CapabilityStore::new(Arc::new(FileConfigProvider::new(path))),
                None => {
                    tracing::warn!("No data directory, discovered names will not persist");
                    CapabilityStore::in_memory()
                }
            },
        };

        let prober = self
            .prober
            .unwrap_or_else(|| Arc::new(ArtifactProber::new(Arc::clone(&transport))));

        Ok(Runtime {
            config,
            transport,
            store,
            prober,
            catalog: self.catalog,
            spans: SpanContext::new(),
        })
    }
}

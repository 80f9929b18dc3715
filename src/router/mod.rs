//! Location-driven mounting of one module at a time.
//!
//! ```text
//!   Idle ──navigate──▶ Mounted(a) ──navigate──▶ Unmounting(a) ──▶ Mounted(b)
//!     │                    │
//!     └──────────┬─────────┘
//!                ▼
//!            NotFound
//! ```
//!
//! The next template is fetched before the current module is torn down, so
//! a failed navigation leaves the previous view in place.

mod nav;
mod table;

pub use nav::{HOME_MODULE, NavEntry, NavMenu};
pub use table::{RouteTable, RouteTarget, normalize};

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::loader::LoadedModules;
use crate::observability::navigate_span;
use crate::plugins::{ContentRegion, PluginKind};
use crate::transport::Transport;

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("Failed to load template for module '{module}': {message}")]
    Template { module: String, message: String },

    #[error("Module '{0}' is not loaded")]
    NotLoaded(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterState {
    Idle,
    Mounted(String),
    Unmounting(String),
    NotFound,
}

impl RouterState {
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::Mounted(name) | Self::Unmounting(name) => Some(name),
            Self::Idle | Self::NotFound => None,
        }
    }
}

pub struct Router {
    modules: LoadedModules,
    table: RouteTable,
    nav: NavMenu,
    templates: Arc<dyn Transport>,
    region: ContentRegion,
    state: RouterState,
    location: Option<String>,
}

impl Router {
    pub fn new(modules: LoadedModules, templates: Arc<dyn Transport>, default_route: &str) -> Self {
        let table = RouteTable::build(&modules, default_route);
        let nav = NavMenu::build(&modules);
        Self {
            modules,
            table,
            nav,
            templates,
            region: ContentRegion::new(),
            state: RouterState::Idle,
            location: None,
        }
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    pub fn current_module(&self) -> Option<&str> {
        match &self.state {
            RouterState::Mounted(name) => Some(name),
            _ => None,
        }
    }

    /// Location after redirects and fallback, once something is shown.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn region(&self) -> &ContentRegion {
        &self.region
    }

    pub fn nav(&self) -> &NavMenu {
        &self.nav
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn modules(&self) -> &LoadedModules {
        &self.modules
    }

    pub async fn navigate(&mut self, token: &str) -> Result<&RouterState, NavigationError> {
        let span = navigate_span(token);
        match self.table.resolve(token, &self.modules) {
            RouteTarget::Module { name, location } => {
                span.record("module", name.as_str());
                if let Err(e) = self.mount(&name).instrument(span.clone()).await {
                    span.in_scope(|| tracing::warn!(module = %name, error = %e, "Navigation failed"));
                    return Err(e);
                }
                self.location = Some(location);
            }
            RouteTarget::NotFound { location } => {
                span.in_scope(|| tracing::debug!(location = %location, "No module for location"));
                self.show_not_found();
                self.location = Some(location);
            }
        }
        Ok(&self.state)
    }

    /// Handles location changes until the sender side closes.
    pub async fn serve(&mut self, mut events: mpsc::Receiver<String>) {
        while let Some(token) = events.recv().await {
            // Failures are logged by `navigate`; the previous view stays.
            let _ = self.navigate(&token).await;
        }
        tracing::debug!("Location channel closed");
    }

    /// Runs the current module's teardown and returns to `Idle`.
    pub fn unmount_current(&mut self) {
        self.teardown();
        self.region.clear();
        self.nav.set_active(None);
        self.state = RouterState::Idle;
    }

    pub fn into_modules(mut self) -> LoadedModules {
        self.unmount_current();
        self.modules
    }

    async fn mount(&mut self, name: &str) -> Result<(), NavigationError> {
        if !self.modules.contains(name) {
            return Err(NavigationError::NotLoaded(name.to_string()));
        }
        let path = PluginKind::Module
            .template_path(name)
            .ok_or_else(|| NavigationError::NotLoaded(name.to_string()))?;
        let html = self
            .templates
            .fetch_text(&path)
            .await
            .map_err(|e| NavigationError::Template {
                module: name.to_string(),
                message: e.to_string(),
            })?;

        self.teardown();
        self.region.set_html(html);
        let module = self
            .modules
            .get_mut(name)
            .ok_or_else(|| NavigationError::NotLoaded(name.to_string()))?;
        module.instance_mut().on_mount(&mut self.region);

        self.nav.set_active(Some(name));
        self.state = RouterState::Mounted(name.to_string());
        tracing::debug!(module = name, "Module mounted");
        Ok(())
    }

    fn teardown(&mut self) {
        if let RouterState::Mounted(previous) = &self.state {
            let previous = previous.clone();
            self.state = RouterState::Unmounting(previous.clone());
            if let Some(module) = self.modules.get_mut(&previous) {
                module.instance_mut().on_unmount();
            }
        }
    }

    fn show_not_found(&mut self) {
        self.teardown();
        self.region.set_html(not_found_html(self.table.default_route()));
        self.nav.set_active(None);
        self.state = RouterState::NotFound;
    }
}

pub fn not_found_html(default_route: &str) -> String {
    format!(
        "<div class=\"not-found\"><h1>404</h1><p>Page not found</p>\
         <a href=\"#{default_route}\">Go to Home</a></div>"
    )
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("state", &self.state)
            .field("location", &self.location)
            .field("modules", &self.modules.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::loader::LoadedModule;
    use crate::plugins::{Module, PluginDescriptor};
    use crate::transport::StaticTransport;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Tracked {
        name: &'static str,
        log: Log,
    }

    impl Module for Tracked {
        fn on_mount(&mut self, region: &mut ContentRegion) {
            self.log.lock().unwrap().push(format!("mount:{}", self.name));
            region.push_html("<!-- ready -->");
        }

        fn on_unmount(&mut self) {
            self.log.lock().unwrap().push(format!("unmount:{}", self.name));
        }
    }

    fn router(names: &[&'static str], transport: StaticTransport, log: &Log) -> Router {
        let mut modules = LoadedModules::new();
        for name in names {
            modules.insert(LoadedModule::new(
                Box::new(Tracked {
                    name: *name,
                    log: Arc::clone(log),
                }),
                Arc::new(PluginDescriptor::new(*name)),
            ));
        }
        Router::new(modules, Arc::new(transport), "/home")
    }

    fn transport() -> StaticTransport {
        StaticTransport::new()
            .with_module("home", "<h1>Home</h1>", None)
            .with_module("settings", "<h1>Settings</h1>", None)
    }

    #[tokio::test]
    async fn test_mount_then_switch_tears_down_first() {
        let log = Log::default();
        let mut router = router(&["home", "settings"], transport(), &log);

        router.navigate("#/home").await.unwrap();
        assert_eq!(router.region().html(), "<h1>Home</h1><!-- ready -->");
        router.navigate("#/settings").await.unwrap();

        assert_eq!(router.state(), &RouterState::Mounted("settings".into()));
        assert_eq!(router.nav().active(), Some("settings"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["mount:home", "unmount:home", "mount:settings"]
        );
    }

    #[tokio::test]
    async fn test_unknown_location_falls_back_to_default() {
        let log = Log::default();
        let mut router = router(&["home"], transport(), &log);

        router.navigate("#/nope").await.unwrap();
        assert_eq!(router.current_module(), Some("home"));
        assert_eq!(router.location(), Some("/home"));
    }

    #[tokio::test]
    async fn test_not_found_when_no_default() {
        let log = Log::default();
        let mut router = router(&["settings"], transport(), &log);

        router.navigate("#/settings").await.unwrap();
        let state = router.navigate("#/nope").await.unwrap();
        assert_eq!(state, &RouterState::NotFound);
        assert!(router.region().html().contains("href=\"#/home\""));
        assert!(router.nav().active().is_none());
        assert_eq!(*log.lock().unwrap(), vec!["mount:settings", "unmount:settings"]);
    }

    #[tokio::test]
    async fn test_template_failure_keeps_previous_view() {
        let log = Log::default();
        let transport = StaticTransport::new().with_module("home", "<h1>Home</h1>", None);
        let mut router = router(&["home", "settings"], transport, &log);

        router.navigate("#/home").await.unwrap();
        let err = router.navigate("#/settings").await.unwrap_err();

        assert!(matches!(err, NavigationError::Template { ref module, .. } if module == "settings"));
        assert_eq!(router.state(), &RouterState::Mounted("home".into()));
        assert!(router.region().html().starts_with("<h1>Home</h1>"));
        assert_eq!(*log.lock().unwrap(), vec!["mount:home"]);
    }

    #[tokio::test]
    async fn test_renavigating_same_module_remounts() {
        let log = Log::default();
        let mut router = router(&["home"], transport(), &log);

        router.navigate("#/home").await.unwrap();
        router.navigate("#/home").await.unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["mount:home", "unmount:home", "mount:home"]
        );
    }

    #[tokio::test]
    async fn test_serve_processes_events_in_order() {
        let log = Log::default();
        let mut router = router(&["home", "settings"], transport(), &log);
        let (tx, rx) = mpsc::channel(8);

        for token in ["#/home", "#/settings", "#/home"] {
            tx.send(token.to_string()).await.unwrap();
        }
        drop(tx);
        router.serve(rx).await;

        assert_eq!(router.current_module(), Some("home"));
        assert_eq!(log.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_into_modules_runs_teardown() {
        let log = Log::default();
        let mut router = router(&["home"], transport(), &log);
        router.navigate("").await.unwrap();

        let modules = router.into_modules();
        assert_eq!(modules.len(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["mount:home", "unmount:home"]);
    }
}

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::prober::Prober;
use super::scan;
use super::store::CapabilityStore;
use crate::config::RuntimeConfig;
use crate::plugins::{PluginKind, Service, default_names};
use crate::transport::Transport;

/// Negative probe results are noise in quiet mode.
macro_rules! absent {
    ($quiet:expr, $($arg:tt)+) => {
        if $quiet {
            tracing::debug!($($arg)+)
        } else {
            tracing::warn!($($arg)+)
        }
    };
}

/// How a single existence check ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Found,
    Absent,
    /// Cut off by the batch deadline before answering.
    Unsettled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Names known after the scan.
    pub total: usize,
    /// Names confirmed by this scan that were not known before.
    pub added: Vec<String>,
}

#[derive(Debug, Default)]
struct EngineState {
    modules: Vec<String>,
    services: Vec<String>,
    quiet: bool,
    initialized: bool,
}

impl EngineState {
    fn names(&self, kind: PluginKind) -> &Vec<String> {
        match kind {
            PluginKind::Module => &self.modules,
            PluginKind::Service => &self.services,
        }
    }

    fn names_mut(&mut self, kind: PluginKind) -> &mut Vec<String> {
        match kind {
            PluginKind::Module => &mut self.modules,
            PluginKind::Service => &mut self.services,
        }
    }
}

/// Finds which plugins exist, remembering confirmed names across sessions.
///
/// Lookup order per kind: the in-memory set loaded from the
/// [`CapabilityStore`], then a static-text scan, then bounded probing of
/// seeds and scanned candidates. Every confirmed name is written through
/// to the store before the call that confirmed it returns.
pub struct DiscoveryEngine {
    store: CapabilityStore,
    prober: Arc<dyn Prober>,
    transport: Arc<dyn Transport>,
    config: RuntimeConfig,
    state: Mutex<EngineState>,
}

impl DiscoveryEngine {
    pub fn new(
        store: CapabilityStore,
        prober: Arc<dyn Prober>,
        transport: Arc<dyn Transport>,
        config: RuntimeConfig,
    ) -> Self {
        let quiet = config.quiet_mode;
        Self {
            store,
            prober,
            transport,
            config,
            state: Mutex::new(EngineState {
                quiet,
                ..Default::default()
            }),
        }
    }

    pub fn store(&self) -> &CapabilityStore {
        &self.store
    }

    /// Loads remembered names and prunes the ones that no longer resolve.
    /// Later calls are no-ops.
    pub async fn init(&self) {
        {
            let mut state = self.state.lock().await;
            if state.initialized {
                return;
            }
            if let Some(quiet) = self.store.quiet_mode().await {
                state.quiet = quiet;
            }
            for kind in PluginKind::ALL {
                let names = self.store.load_names(kind).await.unwrap_or_default();
                *state.names_mut(kind) = dedup(names);
            }
            state.initialized = true;
        }

        let removed = self.cleanup_invalid().await;
        tracing::debug!(removed, "Discovery initialized");
    }

    /// Names of every plugin of `kind` believed to exist.
    ///
    /// Never empty: when nothing is remembered, scanned or confirmed, the
    /// built-in default names are returned without being persisted.
    pub async fn discover_names(&self, kind: PluginKind) -> Vec<String> {
        self.init().await;

        let cached = self.discovered(kind).await;
        if !cached.is_empty() {
            tracing::debug!(%kind, count = cached.len(), "Using remembered names");
            return cached;
        }

        let seeds = self.seeds(kind);
        let scanned = self.scan(kind).await;
        let candidates = self.cap(merge(seeds, scanned));
        let confirmed = found(self.check_all(kind, &candidates, self.config.probe_timeout()).await);

        for name in &confirmed {
            self.add_discovered(kind, name).await;
        }

        let names = self.discovered(kind).await;
        if names.is_empty() {
            tracing::warn!(%kind, "Nothing discovered, using defaults");
            return default_names(kind).iter().map(|n| n.to_string()).collect();
        }
        names
    }

    /// Probes seeds and scanned names that are not yet known, keeping the
    /// ones that resolve.
    pub async fn discover_new(&self, kind: PluginKind) -> DiscoveryReport {
        self.init().await;

        let known = self.discovered(kind).await;
        let scanned = self.scan(kind).await;
        let candidates: Vec<String> = merge(self.seeds(kind), scanned)
            .into_iter()
            .filter(|name| !known.contains(name))
            .collect();
        let candidates = self.cap(candidates);

        let mut added = Vec::new();
        for name in found(self.check_all(kind, &candidates, self.config.probe_timeout()).await) {
            if self.add_discovered(kind, &name).await {
                added.push(name);
            }
        }

        let total = self.state.lock().await.names(kind).len();
        if !added.is_empty() {
            tracing::info!(%kind, added = ?added, total, "Discovered new plugins");
        }
        DiscoveryReport { total, added }
    }

    /// Subset of `names` confirmed to resolve within the validation
    /// deadline, in input order.
    pub async fn validate(&self, kind: PluginKind, names: &[String]) -> Vec<String> {
        found(self.check_all(kind, names, self.config.validation_timeout()).await)
    }

    /// Drops remembered names that answered "absent" and persists the
    /// pruned sets. Names still unanswered at the validation deadline are
    /// kept. Returns how many names were removed.
    pub async fn cleanup_invalid(&self) -> usize {
        let mut removed = 0;
        for kind in PluginKind::ALL {
            let known = self.discovered(kind).await;
            if known.is_empty() {
                continue;
            }
            let outcomes = self.check_all(kind, &known, self.config.validation_timeout()).await;

            let unsettled: Vec<&String> = outcomes
                .iter()
                .filter(|(_, p)| *p == Presence::Unsettled)
                .map(|(n, _)| n)
                .collect();
            if !unsettled.is_empty() {
                tracing::debug!(%kind, unsettled = ?unsettled, "Validation deadline reached, keeping names");
            }

            let invalid: Vec<String> = outcomes
                .into_iter()
                .filter(|(_, p)| *p == Presence::Absent)
                .map(|(n, _)| n)
                .collect();
            if invalid.is_empty() {
                continue;
            }
            tracing::info!(%kind, invalid = ?invalid, "Forgetting plugins that no longer resolve");
            removed += invalid.len();

            let mut state = self.state.lock().await;
            state.names_mut(kind).retain(|n| !invalid.contains(n));
            self.store.save_names(kind, state.names(kind)).await;
        }
        removed
    }

    /// Records `name` and persists the set. Returns `false` when the name
    /// was already known.
    pub async fn add_discovered(&self, kind: PluginKind, name: &str) -> bool {
        let mut state = self.state.lock().await;
        if state.names(kind).iter().any(|n| n == name) {
            return false;
        }
        state.names_mut(kind).push(name.to_string());
        self.store.save_names(kind, state.names(kind)).await;
        true
    }

    pub async fn discovered(&self, kind: PluginKind) -> Vec<String> {
        self.state.lock().await.names(kind).clone()
    }

    /// Forgets every remembered name, in memory and in the store.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.modules.clear();
        state.services.clear();
        self.store.clear().await;
    }

    pub async fn quiet_mode(&self) -> bool {
        self.state.lock().await.quiet
    }

    pub async fn set_quiet_mode(&self, quiet: bool) {
        self.state.lock().await.quiet = quiet;
        self.store.set_quiet_mode(quiet).await;
    }

    fn seeds(&self, kind: PluginKind) -> Vec<String> {
        match kind {
            PluginKind::Module => self.config.module_seeds.clone(),
            PluginKind::Service => self.config.service_seeds.clone(),
        }
    }

    fn cap(&self, mut candidates: Vec<String>) -> Vec<String> {
        if candidates.len() > self.config.max_probe_candidates {
            tracing::debug!(
                candidates = candidates.len(),
                max = self.config.max_probe_candidates,
                "Truncating probe batch"
            );
            candidates.truncate(self.config.max_probe_candidates);
        }
        candidates
    }

    /// Modules come from links in the entry document. Services come from
    /// imports in the bootstrap script and in every remembered module's
    /// script.
    async fn scan(&self, kind: PluginKind) -> Vec<String> {
        let quiet = self.quiet_mode().await;
        match kind {
            PluginKind::Module => match self.transport.fetch_text(&self.config.entry_document).await {
                Ok(text) => scan::module_links(&text),
                Err(e) => {
                    absent!(quiet, document = %self.config.entry_document, error = %e, "Entry document unavailable");
                    Vec::new()
                }
            },
            PluginKind::Service => {
                let mut sources = vec![self.config.bootstrap_script.clone()];
                sources.extend(
                    self.discovered(PluginKind::Module)
                        .await
                        .iter()
                        .map(|m| PluginKind::Module.script_path(m)),
                );

                let mut names = Vec::new();
                for source in sources {
                    match self.transport.fetch_text(&source).await {
                        Ok(text) => names = merge(names, scan::service_imports(&text)),
                        Err(e) => {
                            absent!(quiet, script = %source, error = %e, "Script unavailable for scanning");
                        }
                    }
                }
                names
            }
        }
    }

    /// Checks `names` concurrently under one shared deadline. On expiry the
    /// batch token is cancelled; answers already in hand are kept and the
    /// rest come back [`Presence::Unsettled`].
    async fn check_all(
        &self,
        kind: PluginKind,
        names: &[String],
        deadline: Duration,
    ) -> Vec<(String, Presence)> {
        if names.is_empty() {
            return Vec::new();
        }
        let quiet = self.quiet_mode().await;
        let token = CancellationToken::new();

        let checks = names.iter().map(|name| {
            let token = token.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Presence::Unsettled,
                    found = self.prober.exists(kind, name, &token) => {
                        if found { Presence::Found } else { Presence::Absent }
                    }
                }
            }
        });
        let batch = futures::future::join_all(checks);
        tokio::pin!(batch);

        let outcomes = tokio::select! {
            outcomes = &mut batch => outcomes,
            _ = tokio::time::sleep(deadline) => {
                tracing::debug!(%kind, deadline_ms = deadline.as_millis() as u64, "Existence check deadline reached");
                token.cancel();
                batch.await
            }
        };

        names
            .iter()
            .cloned()
            .zip(outcomes)
            .inspect(|(name, presence)| match presence {
                Presence::Found => {}
                Presence::Absent => absent!(quiet, %kind, name = %name, "Plugin not found"),
                Presence::Unsettled => absent!(quiet, %kind, name = %name, "Plugin did not answer in time"),
            })
            .collect()
    }
}

/// Names that answered "found". Unsettled names count as absent here.
fn found(outcomes: Vec<(String, Presence)>) -> Vec<String> {
    outcomes
        .into_iter()
        .filter_map(|(name, presence)| (presence == Presence::Found).then_some(name))
        .collect()
}

fn dedup(names: Vec<String>) -> Vec<String> {
    merge(Vec::new(), names)
}

fn merge(mut into: Vec<String>, more: Vec<String>) -> Vec<String> {
    for name in more {
        if !into.contains(&name) {
            into.push(name);
        }
    }
    into
}

#[async_trait]
impl Service for DiscoveryEngine {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn init(&self, _config: &Value) -> crate::Result<()> {
        DiscoveryEngine::init(self).await;
        Ok(())
    }
}

impl std::fmt::Debug for DiscoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryEngine")
            .field("store", &self.store)
            .field("probe_timeout_ms", &self.config.probe_timeout_ms)
            .finish_non_exhaustive()
    }
}

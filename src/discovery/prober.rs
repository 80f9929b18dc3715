//! Existence probes for individual plugin names.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::plugins::PluginKind;
use crate::transport::Transport;

#[async_trait]
pub trait Prober: Send + Sync {
    /// `false` on absence, error or cancellation.
    async fn exists(&self, kind: PluginKind, name: &str, cancel: &CancellationToken) -> bool;
}

/// Checks plugin artifacts through a [`Transport`]. A service exists when
/// its script does; a module needs both script and template.
pub struct ArtifactProber {
    transport: Arc<dyn Transport>,
}

impl ArtifactProber {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Prober for ArtifactProber {
    async fn exists(&self, kind: PluginKind, name: &str, cancel: &CancellationToken) -> bool {
        let script = kind.script_path(name);
        match kind.template_path(name) {
            None => self.transport.exists(&script, cancel).await,
            Some(template) => {
                let (has_script, has_template) = futures::join!(
                    self.transport.exists(&script, cancel),
                    self.transport.exists(&template, cancel)
                );
                has_script && has_template
            }
        }
    }
}

/// Prober with a fixed answer per name and optional artificial latency.
#[derive(Debug, Default)]
pub struct ScriptedProber {
    present: RwLock<HashSet<(PluginKind, String)>>,
    delays: HashMap<(PluginKind, String), Duration>,
    calls: RwLock<Vec<(PluginKind, String)>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_present(mut self, kind: PluginKind, names: &[&str]) -> Self {
        self.present
            .get_mut()
            .extend(names.iter().map(|n| (kind, n.to_string())));
        self
    }

    /// The probe for `name` answers only after `delay` unless cancelled.
    pub fn with_delay(mut self, kind: PluginKind, name: &str, delay: Duration) -> Self {
        self.delays.insert((kind, name.to_string()), delay);
        self
    }

    pub async fn set_present(&self, kind: PluginKind, name: &str, present: bool) {
        let mut set = self.present.write().await;
        if present {
            set.insert((kind, name.to_string()));
        } else {
            set.remove(&(kind, name.to_string()));
        }
    }

    pub async fn calls(&self) -> Vec<(PluginKind, String)> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn exists(&self, kind: PluginKind, name: &str, cancel: &CancellationToken) -> bool {
        let key = (kind, name.to_string());
        self.calls.write().await.push(key.clone());

        if let Some(delay) = self.delays.get(&key) {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(*delay) => {}
            }
        }
        !cancel.is_cancelled() && self.present.read().await.contains(&key)
    }
}

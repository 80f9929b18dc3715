//! Fetches plugin descriptors through the transport.

use std::sync::Arc;

use super::{DescriptorSet, PluginDescriptor, PluginError, PluginKind};
use crate::transport::Transport;

pub struct DescriptorSource {
    transport: Arc<dyn Transport>,
}

impl DescriptorSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn fetch(&self, kind: PluginKind, name: &str) -> Result<PluginDescriptor, PluginError> {
        let path = kind.descriptor_path(name);
        let document = self.transport.fetch_text(&path).await.map_err(|e| {
            tracing::debug!(%kind, name, path = %path, error = %e, "Descriptor fetch failed");
            PluginError::DescriptorNotFound {
                kind,
                name: name.to_string(),
                path: path.clone(),
            }
        })?;

        PluginDescriptor::parse(name, &document).map_err(|e| PluginError::InvalidDescriptor {
            kind,
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Never fails: a missing or malformed document yields the synthesized
    /// default for `name`.
    pub async fn load(&self, kind: PluginKind, name: &str) -> PluginDescriptor {
        match self.fetch(kind, name).await {
            Ok(descriptor) => descriptor,
            Err(e @ PluginError::InvalidDescriptor { .. }) => {
                tracing::warn!(%kind, name, error = %e, "Using default descriptor");
                PluginDescriptor::synthesized(kind, name)
            }
            Err(_) => PluginDescriptor::synthesized(kind, name),
        }
    }

    pub async fn load_all(&self, kind: PluginKind, names: &[String]) -> DescriptorSet {
        let descriptors =
            futures::future::join_all(names.iter().map(|name| self.load(kind, name))).await;
        descriptors.into_iter().collect()
    }
}

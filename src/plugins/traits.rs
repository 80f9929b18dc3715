//! Plugin capability traits.

use std::any::Any;

use async_trait::async_trait;
use serde_json::Value;

/// A shared, long-lived capability. Registered once per runtime and looked
/// up by name through the service registry.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    /// Runs once, in dependency order, with the descriptor's `config`
    /// object (`{}` when absent). An error drops the service.
    async fn init(&self, _config: &Value) -> crate::Result<()> {
        Ok(())
    }
}

/// A routable view plugin. Every hook is optional.
pub trait Module: Send + Sync {
    /// Takes precedence over the descriptor's title.
    fn title(&self) -> Option<&str> {
        None
    }

    /// Takes precedence over the descriptor's `navItem`.
    fn nav_item(&self) -> Option<bool> {
        None
    }

    /// Called after the template has been placed into `region`.
    fn on_mount(&mut self, _region: &mut ContentRegion) {}

    /// Called before the next module replaces this one.
    fn on_unmount(&mut self) {}
}

/// The single host region a mounted module renders into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRegion {
    html: String,
}

impl ContentRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn set_html(&mut self, html: impl Into<String>) {
        self.html = html.into();
    }

    pub fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub fn clear(&mut self) {
        self.html.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

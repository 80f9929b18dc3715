//! In-memory transport over a path → body map.
//!
//! Used by tests and by hosts that ship their plugin artifacts embedded in
//! the binary.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::{Transport, clean_path};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct StaticTransport {
    files: RwLock<HashMap<String, String>>,
    requests: RwLock<Vec<String>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<str>, body: impl Into<String>) -> Self {
        self.files
            .get_mut()
            .insert(clean_path(path.as_ref()).to_string(), body.into());
        self
    }

    /// Adds the script, template and optional descriptor of a module.
    pub fn with_module(self, name: &str, template: &str, descriptor: Option<&str>) -> Self {
        let this = self
            .with_file(format!("modules/{name}/{name}.js"), "")
            .with_file(format!("modules/{name}/{name}.html"), template);
        match descriptor {
            Some(json) => this.with_file(format!("modules/{name}/module.json"), json),
            None => this,
        }
    }

    /// Adds the script and optional descriptor of a service.
    pub fn with_service(self, name: &str, descriptor: Option<&str>) -> Self {
        let this = self.with_file(format!("services/{name}/{name}.js"), "");
        match descriptor {
            Some(json) => this.with_file(format!("services/{name}/service.json"), json),
            None => this,
        }
    }

    pub async fn insert(&self, path: &str, body: impl Into<String>) {
        self.files
            .write()
            .await
            .insert(clean_path(path).to_string(), body.into());
    }

    pub async fn remove(&self, path: &str) -> bool {
        self.files.write().await.remove(clean_path(path)).is_some()
    }

    /// Every path requested so far, in order, existence checks included.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    async fn record(&self, path: &str) {
        self.requests.write().await.push(path.to_string());
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn exists(&self, path: &str, cancel: &CancellationToken) -> bool {
        let path = clean_path(path);
        self.record(path).await;
        if cancel.is_cancelled() {
            return false;
        }
        self.files.read().await.contains_key(path)
    }

    async fn fetch_text(&self, path: &str) -> Result<String> {
        let path = clean_path(path);
        self.record(path).await;
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_and_exists() {
        let transport = StaticTransport::new()
            .with_file("./index.html", "<nav></nav>")
            .with_module("home", "<h1>Home</h1>", None);

        let token = CancellationToken::new();
        assert!(transport.exists("modules/home/home.js", &token).await);
        assert!(transport.exists("/modules/home/home.html", &token).await);
        assert!(!transport.exists("modules/home/module.json", &token).await);
        assert_eq!(transport.fetch_text("index.html").await.unwrap(), "<nav></nav>");
        assert!(matches!(
            transport.fetch_text("app.js").await,
            Err(Error::NotFound(p)) if p == "app.js"
        ));
    }

    #[tokio::test]
    async fn test_cancelled_token_reads_absent() {
        let transport = StaticTransport::new().with_service("api", None);
        let token = CancellationToken::new();
        token.cancel();
        assert!(!transport.exists("services/api/api.js", &token).await);
    }

    #[tokio::test]
    async fn test_remove_and_request_log() {
        let transport = StaticTransport::new().with_service("theme", None);
        assert!(transport.remove("services/theme/theme.js").await);
        let token = CancellationToken::new();
        assert!(!transport.exists("services/theme/theme.js", &token).await);
        assert_eq!(transport.requests().await, vec!["services/theme/theme.js"]);
    }
}

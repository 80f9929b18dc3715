//! Artifact transport: existence checks and text fetches by relative path.
//!
//! Discovery, descriptor loading and template rendering all reach plugin
//! artifacts through this seam. Paths are relative to the host root, e.g.
//! `modules/home/home.html`.

mod http;
mod memory;

pub use http::HttpTransport;
pub use memory::StaticTransport;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Lightweight existence request.
    ///
    /// Never fails: an error, a non-success status or a cancelled token
    /// all read as "does not exist".
    async fn exists(&self, path: &str, cancel: &CancellationToken) -> bool;

    /// Fetches the artifact body as text.
    async fn fetch_text(&self, path: &str) -> crate::Result<String>;
}

/// `modules/home/home.html` → `modules/home/home.html`; `./app.js` → `app.js`.
pub(crate) fn clean_path(path: &str) -> &str {
    let path = path.strip_prefix("./").unwrap_or(path);
    path.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("./index.html"), "index.html");
        assert_eq!(clean_path("/services/api/api.js"), "services/api/api.js");
        assert_eq!(clean_path("modules/home/home.js"), "modules/home/home.js");
    }
}

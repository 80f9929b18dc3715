//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, USER_AGENT};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{Transport, clean_path};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// `base_url` is treated as a directory; a missing trailing slash is added.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("modhost/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized)?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base URL '{}' cannot be used as a base",
                base_url
            )));
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(clean_path(path))?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exists(&self, path: &str, cancel: &CancellationToken) -> bool {
        let Ok(url) = self.url_for(path) else {
            return false;
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            response = self.client.head(url).send() => match response {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    tracing::trace!(path, error = %e, "Existence request failed");
                    false
                }
            },
        }
    }

    async fn fetch_text(&self, path: &str) -> Result<String> {
        let url = self.url_for(path)?;
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

//! # modhost
//!
//! Runtime for hosts whose features ship as independently deployable
//! plugins: shared **services** and routable **modules**.
//!
//! The runtime discovers which plugins exist without listing directories,
//! orders services by their declared dependencies, loads each plugin in
//! isolation and routes location changes to exactly one mounted module.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use modhost::config::{MemoryConfigProvider, RuntimeConfig};
//! use modhost::plugins::{Module, PluginCatalog};
//! use modhost::{Runtime, ShellView};
//!
//! #[derive(Default)]
//! struct Home;
//! impl Module for Home {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), modhost::Error> {
//!     let runtime = Runtime::builder()
//!         .config(RuntimeConfig::default().with_base_url("http://localhost:8080"))
//!         .store(Arc::new(MemoryConfigProvider::new()))
//!         .catalog(PluginCatalog::new().module_default::<Home>("home"))
//!         .build()?;
//!
//!     let shell = runtime.start("#/home").await;
//!     if let ShellView::Content { module, .. } = shell.view() {
//!         println!("showing {module}");
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod discovery;
pub mod loader;
pub mod observability;
pub mod plugins;
pub mod prelude;
pub mod registry;
pub mod router;
pub mod runtime;
pub mod transport;

pub use config::{ConfigBuilder, ConfigError, ConfigProvider, RuntimeConfig};
pub use discovery::{CapabilityStore, DiscoveryEngine, DiscoveryReport, Prober};
pub use loader::{DependencyResolver, LoadedModules, Resolution};
pub use plugins::{
    ContentRegion, DescriptorSet, Module, PluginCatalog, PluginDescriptor, PluginError,
    PluginKind, Service,
};
pub use registry::{ServiceEntry, ServiceRegistry};
pub use router::{NavigationError, Router, RouterState};
pub use runtime::{BootReport, Runtime, RuntimeBuilder, RuntimeContext, Shell, ShellView};
pub use transport::{HttpTransport, StaticTransport, Transport};

/// Error type for modhost operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Network connectivity or request failed, including non-success status.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable invalid.
    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    /// Artifact absent from an in-memory transport.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration, URL or setup errors
    Configuration,
    /// Network or missing-artifact errors that may succeed on retry
    Transient,
    /// A single plugin failed to load
    Plugin,
    /// A navigation could not complete
    Navigation,
    /// Internal errors (IO, JSON, unexpected states)
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::Url(_) | Error::Env(_) => ErrorCategory::Configuration,

            Error::Network(_) | Error::NotFound(_) => ErrorCategory::Transient,

            Error::Plugin(_) => ErrorCategory::Plugin,
            Error::Navigation(_) => ErrorCategory::Navigation,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::InvalidValue { key, message } => {
                Error::Config(format!("Invalid value for {}: {}", key, message))
            }
            config::ConfigError::Serialization(e) => Error::Json(e),
            config::ConfigError::Io(e) => Error::Io(e),
            config::ConfigError::Env(e) => Error::Env(e),
            config::ConfigError::ReadOnly { provider } => {
                Error::Config(format!("Provider '{}' is read-only", provider))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Prelude module for convenient imports.
//!
//! ```rust
//! use modhost::prelude::*;
//! ```

pub use crate::Error;
pub use crate::Result;

pub use crate::config::{ConfigProvider, ConfigProviderExt, MemoryConfigProvider, RuntimeConfig};

pub use crate::plugins::{
    ContentRegion, Module, PluginCatalog, PluginDescriptor, PluginError, PluginKind, Service,
};

pub use crate::registry::ServiceRegistry;

pub use crate::runtime::{Runtime, RuntimeBuilder, Shell, ShellView};

pub use crate::router::{NavigationError, RouterState};

pub use crate::transport::{HttpTransport, StaticTransport, Transport};

pub use async_trait::async_trait;

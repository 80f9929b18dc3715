//! Plugin model: kinds, descriptors, capability traits and factories.
//!
//! Plugins live one directory each under `services/` or `modules/`:
//!
//! ```text
//! <root>/
//! ├── services/
//! │   └── api/
//! │       ├── api.js
//! │       └── service.json     (optional)
//! └── modules/
//!     └── home/
//!         ├── home.js
//!         ├── home.html
//!         └── module.json      (optional)
//! ```
//!
//! A plugin's behavior comes from the [`PluginCatalog`]; its artifacts only
//! signal presence and carry metadata.

mod catalog;
mod descriptor;
mod error;
mod kind;
mod source;
mod traits;

pub use catalog::{ModuleFactory, PluginCatalog, ServiceFactory};
pub use descriptor::{
    DEFAULT_MODULES, DEFAULT_SERVICES, DEFAULT_VERSION, DescriptorSet, PluginDescriptor, RouteSpec,
    capitalize, default_names,
};
pub use error::PluginError;
pub use kind::PluginKind;
pub use source::DescriptorSource;
pub use traits::{ContentRegion, Module, Service};

pub(crate) use error::panic_message;

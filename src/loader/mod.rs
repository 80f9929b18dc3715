//! Turns descriptors into live plugins.
//!
//! Services load in dependency order and each initializes before the next
//! starts. Modules load afterwards and only when every service they name in
//! `requiredServices` made it into the registry.

mod module;
mod resolver;
mod service;

pub use module::{LoadedModule, LoadedModules, ModuleLoader};
pub use resolver::{DependencyResolver, Resolution, UnsatisfiedDependency, UnsatisfiedReason};
pub use service::ServiceLoader;

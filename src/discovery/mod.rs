//! Capability discovery: which modules and services exist.
//!
//! Existence is decided by artifacts at well-known locations, never by a
//! directory listing. Remembered names survive sessions through the
//! [`CapabilityStore`] and are re-validated on start-up.

mod engine;
mod prober;
pub mod scan;
mod store;

pub use engine::{DiscoveryEngine, DiscoveryReport};
pub use prober::{ArtifactProber, Prober, ScriptedProber};
pub use store::{CapabilityStore, MODULES_KEY, QUIET_MODE_KEY, SERVICES_KEY};

/// Service name under which the engine registers itself.
pub const DISCOVERY_SERVICE: &str = "discovery";

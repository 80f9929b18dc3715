//! Name-keyed registry of initialized services.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::plugins::{PluginDescriptor, PluginError, Service};

/// A loaded service together with the descriptor it was loaded from.
#[derive(Clone)]
pub struct ServiceEntry {
    descriptor: Arc<PluginDescriptor>,
    instance: Arc<dyn Service>,
}

impl ServiceEntry {
    /// Create a new entry for an initialized `instance`.
    pub fn new(descriptor: Arc<PluginDescriptor>, instance: Arc<dyn Service>) -> Self {
        Self {
            descriptor,
            instance,
        }
    }

    /// Get the service name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Get the descriptor the service was loaded from.
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Get the shared service instance.
    pub fn instance(&self) -> &Arc<dyn Service> {
        &self.instance
    }

    /// Borrow the instance as its concrete type, if it is a `T`.
    pub fn downcast<T: Service>(&self) -> Option<&T> {
        self.instance.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("name", &self.name())
            .field("version", &self.descriptor.version)
            .finish_non_exhaustive()
    }
}

/// Populated once during boot, read-only afterwards. Iteration follows
/// registration order, which is the resolved dependency order.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    entries: Vec<ServiceEntry>,
    index: HashMap<String, usize>,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `entry`. A second entry under the same name is rejected.
    pub fn register(&mut self, entry: ServiceEntry) -> Result<(), PluginError> {
        if self.index.contains_key(entry.name()) {
            return Err(PluginError::AlreadyRegistered {
                name: entry.name().to_string(),
            });
        }
        self.index.insert(entry.name().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Get the entry registered under `name`.
    pub fn get(&self, name: &str) -> Option<&ServiceEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Get service `name` as its concrete type.
    pub fn get_as<T: Service>(&self, name: &str) -> Option<&T> {
        self.get(name)?.downcast::<T>()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names from `required` that are not registered, in the given order.
    pub fn missing<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| !self.contains(name))
            .map(String::as_str)
            .collect()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(ServiceEntry::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

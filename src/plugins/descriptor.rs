//! Plugin descriptors and insertion-ordered descriptor sets.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PluginKind;

pub const DEFAULT_VERSION: &str = "1.0.0";

pub const DEFAULT_SERVICES: [&str; 4] = ["theme", "storage", "api", "jsonImport"];
pub const DEFAULT_MODULES: [&str; 2] = ["home", "settings"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(default, rename = "default", alias = "isDefault")]
    pub is_default: bool,
}

/// Metadata a plugin ships in its `module.json` or `service.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_item: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_order: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api: Vec<String>,
    #[serde(default = "empty_object")]
    pub config: Value,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: String::new(),
            title: None,
            dependencies: Vec::new(),
            required_services: Vec::new(),
            nav_item: None,
            nav_order: None,
            routes: Vec::new(),
            api: Vec::new(),
            config: empty_object(),
        }
    }

    /// Descriptor used when a plugin ships none or an unreadable one.
    pub fn synthesized(kind: PluginKind, name: &str) -> Self {
        let title = capitalize(name);
        let mut descriptor = Self::new(name);
        descriptor.description = format!("{title} {kind}");
        descriptor.title = Some(title);
        if kind == PluginKind::Module {
            descriptor.nav_item = Some(true);
        }
        descriptor
    }

    /// Parses a descriptor document, forcing `name` to the directory name.
    pub fn parse(name: &str, document: &str) -> serde_json::Result<Self> {
        let mut descriptor: Self = serde_json::from_str(document)?;
        descriptor.name = name.to_string();
        descriptor.required_services = dedup(std::mem::take(&mut descriptor.required_services));
        if !descriptor.config.is_object() {
            descriptor.config = empty_object();
        }
        Ok(descriptor)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_services = dedup(services.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_nav(mut self, nav_item: bool, nav_order: Option<f64>) -> Self {
        self.nav_item = Some(nav_item);
        self.nav_order = nav_order;
        self
    }

    pub fn with_route(mut self, route: RouteSpec) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// `jsonImport` → `JsonImport`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Descriptors keyed by name, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    entries: Vec<Arc<PluginDescriptor>>,
    index: HashMap<String, usize>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesized descriptors for the built-in fallback names.
    pub fn defaults(kind: PluginKind) -> Self {
        default_names(kind)
            .iter()
            .map(|name| PluginDescriptor::synthesized(kind, name))
            .collect()
    }

    /// Replaces an existing entry in place, keeping its position.
    pub fn insert(&mut self, descriptor: PluginDescriptor) {
        let descriptor = Arc::new(descriptor);
        match self.index.get(&descriptor.name) {
            Some(&i) => self.entries[i] = descriptor,
            None => {
                self.index
                    .insert(descriptor.name.clone(), self.entries.len());
                self.entries.push(descriptor);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PluginDescriptor>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|d| d.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PluginDescriptor>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PluginDescriptor> for DescriptorSet {
    fn from_iter<I: IntoIterator<Item = PluginDescriptor>>(iter: I) -> Self {
        let mut set = Self::new();
        for descriptor in iter {
            set.insert(descriptor);
        }
        set
    }
}

pub fn default_names(kind: PluginKind) -> &'static [&'static str] {
    match kind {
        PluginKind::Service => &DEFAULT_SERVICES,
        PluginKind::Module => &DEFAULT_MODULES,
    }
}

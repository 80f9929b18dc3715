//! Location tokens to module names.

use std::collections::HashMap;

use crate::loader::LoadedModules;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Mount this module; `location` is the path after redirects.
    Module { name: String, location: String },
    NotFound { location: String },
}

/// Redirects and the default location, built from the loaded modules'
/// declared routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    redirects: HashMap<String, String>,
    default_route: String,
}

impl RouteTable {
    pub fn new(default_route: &str) -> Self {
        Self {
            redirects: HashMap::new(),
            default_route: normalize(default_route),
        }
    }

    /// A route marked default overrides `default_route`; among several the
    /// last module in load order wins.
    pub fn build(modules: &LoadedModules, default_route: &str) -> Self {
        let mut table = Self::new(default_route);
        for module in modules.iter() {
            for route in &module.descriptor().routes {
                let path = if route.path.trim_matches('/').is_empty() {
                    format!("/{}", module.name())
                } else {
                    normalize(&route.path)
                };
                if let Some(target) = &route.redirect_to {
                    table.add_redirect(&path, target);
                }
                if route.is_default {
                    table.default_route = path;
                }
            }
        }
        table
    }

    pub fn add_redirect(&mut self, from: &str, to: &str) {
        self.redirects.insert(normalize(from), normalize(to));
    }

    pub fn default_route(&self) -> &str {
        &self.default_route
    }

    pub fn redirect_for(&self, location: &str) -> Option<&str> {
        self.redirects.get(&normalize(location)).map(String::as_str)
    }

    /// Applies at most one redirect, then picks the module named by the
    /// first path segment. Unknown names fall back to the default location;
    /// a redirect back onto itself is not found.
    pub fn resolve(&self, token: &str, modules: &LoadedModules) -> RouteTarget {
        let requested = normalize(token);
        let location = match self.redirects.get(&requested) {
            Some(target) if *target == requested => {
                tracing::warn!(location = %requested, "Redirect points at itself");
                return RouteTarget::NotFound { location: requested };
            }
            Some(target) => target.clone(),
            None => requested,
        };

        if let Some(name) = first_segment(&location)
            && modules.contains(name)
        {
            return RouteTarget::Module {
                name: name.to_string(),
                location,
            };
        }

        match first_segment(&self.default_route) {
            Some(name) if modules.contains(name) => RouteTarget::Module {
                name: name.to_string(),
                location: self.default_route.clone(),
            },
            _ => RouteTarget::NotFound { location },
        }
    }
}

/// `#/home`, `home` and `/home` all become `/home`; empty becomes `/`.
pub fn normalize(token: &str) -> String {
    let path = token.trim();
    let path = path.strip_prefix('#').unwrap_or(path);
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn first_segment(location: &str) -> Option<&str> {
    location
        .trim_start_matches('/')
        .split(['/', '?'])
        .next()
        .filter(|s| !s.is_empty())
}

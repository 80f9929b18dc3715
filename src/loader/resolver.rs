//! Depth-first dependency ordering for services.

use std::collections::HashSet;

use crate::discovery::DISCOVERY_SERVICE;
use crate::plugins::DescriptorSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsatisfiedReason {
    /// The dependency has no descriptor in the set.
    Missing,
    /// The dependency was rejected as part of a cycle.
    Cyclic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatisfiedDependency {
    pub dependent: String,
    pub dependency: String,
    pub reason: UnsatisfiedReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Load order: every name appears after its resolvable dependencies.
    pub order: Vec<String>,
    /// Each cycle as a closed path, e.g. `["a", "b", "c", "a"]`.
    pub cycles: Vec<Vec<String>>,
    pub unsatisfied: Vec<UnsatisfiedDependency>,
}

impl Resolution {
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty() && self.unsatisfied.is_empty()
    }

    /// Names left out of the order because they sit on a cycle.
    pub fn rejected(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for cycle in &self.cycles {
            for name in cycle {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Orders descriptors so dependencies load first.
///
/// Tolerant by construction: cycles and unknown dependencies are logged
/// and reported in the [`Resolution`] instead of failing the whole set.
/// Members of a cycle are excluded from the order; their dependents and
/// the dependents of missing names still load. Output is deterministic
/// for a given descriptor insertion order.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    bootstrap: Option<String>,
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self {
            bootstrap: Some(DISCOVERY_SERVICE.to_string()),
        }
    }
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bootstrap name, when present, is visited before every other
    /// name, so it lands first unless it has dependencies of its own.
    pub fn with_bootstrap(mut self, name: impl Into<String>) -> Self {
        self.bootstrap = Some(name.into());
        self
    }

    pub fn without_bootstrap(mut self) -> Self {
        self.bootstrap = None;
        self
    }

    pub fn resolve(&self, descriptors: &DescriptorSet) -> Resolution {
        let mut walk = Walk {
            descriptors,
            done: HashSet::new(),
            rejected: HashSet::new(),
            path: Vec::new(),
            resolution: Resolution::default(),
        };

        if let Some(bootstrap) = self
            .bootstrap
            .as_deref()
            .and_then(|name| descriptors.get(name))
        {
            walk.visit(&bootstrap.name);
        }
        for name in descriptors.names() {
            walk.visit(name);
        }

        walk.resolution
    }
}

struct Walk<'a> {
    descriptors: &'a DescriptorSet,
    done: HashSet<&'a str>,
    rejected: HashSet<&'a str>,
    path: Vec<&'a str>,
    resolution: Resolution,
}

impl<'a> Walk<'a> {
    fn visit(&mut self, name: &'a str) {
        if self.done.contains(name) {
            return;
        }

        if let Some(start) = self.path.iter().position(|n| *n == name) {
            let mut cycle: Vec<String> = self.path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            tracing::warn!(cycle = %cycle.join(" -> "), "Circular dependency detected");
            self.rejected.extend(self.path[start..].iter().copied());
            self.resolution.cycles.push(cycle);
            return;
        }

        let Some(descriptor) = self.descriptors.get(name) else {
            return;
        };

        self.path.push(name);
        for dep in &descriptor.dependencies {
            let dep = dep.as_str();
            if !self.descriptors.contains(dep) {
                tracing::warn!(service = name, dependency = dep, "Dependency not found");
                self.unsatisfied(name, dep, UnsatisfiedReason::Missing);
                continue;
            }
            self.visit(dep);
            if self.rejected.contains(dep) && !self.rejected.contains(name) {
                tracing::warn!(service = name, dependency = dep, "Dependency rejected as cyclic");
                self.unsatisfied(name, dep, UnsatisfiedReason::Cyclic);
            }
        }
        self.path.pop();

        self.done.insert(name);
        if !self.rejected.contains(name) {
            self.resolution.order.push(name.to_string());
        }
    }

    fn unsatisfied(&mut self, dependent: &str, dependency: &str, reason: UnsatisfiedReason) {
        self.resolution.unsatisfied.push(UnsatisfiedDependency {
            dependent: dependent.to_string(),
            dependency: dependency.to_string(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PluginDescriptor;

    fn set(entries: &[(&str, &[&str])]) -> DescriptorSet {
        entries
            .iter()
            .map(|(name, deps)| PluginDescriptor::new(*name).with_dependencies(deps.iter().copied()))
            .collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_dependencies_come_first() {
        let descriptors = set(&[
            ("api", &["storage"]),
            ("theme", &["storage"]),
            ("storage", &[]),
            ("jsonImport", &["api", "storage"]),
        ]);

        let resolution = DependencyResolver::new().resolve(&descriptors);
        assert!(resolution.is_clean());
        assert_eq!(resolution.order, vec!["storage", "api", "theme", "jsonImport"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let descriptors = set(&[("c", &["a"]), ("b", &[]), ("a", &[]), ("d", &["c", "b"])]);
        let resolver = DependencyResolver::new();
        let first = resolver.resolve(&descriptors);
        for _ in 0..10 {
            assert_eq!(resolver.resolve(&descriptors), first);
        }
        assert_eq!(first.order, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_bootstrap_forced_first() {
        let descriptors = set(&[("theme", &[]), ("api", &[]), ("discovery", &[])]);
        let resolution = DependencyResolver::new().resolve(&descriptors);
        assert_eq!(resolution.order, vec!["discovery", "theme", "api"]);

        let resolution = DependencyResolver::new()
            .without_bootstrap()
            .resolve(&descriptors);
        assert_eq!(resolution.order, vec!["theme", "api", "discovery"]);
    }

    #[test]
    fn test_bootstrap_dependencies_still_precede_it() {
        let descriptors = set(&[("theme", &[]), ("storage", &[]), ("discovery", &["storage"])]);
        let resolution = DependencyResolver::new().resolve(&descriptors);
        assert_eq!(resolution.order, vec!["storage", "discovery", "theme"]);
    }

    #[test]
    fn test_cycle_reported_with_full_path() {
        let descriptors = set(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"]), ("d", &[])]);
        let resolution = DependencyResolver::new().resolve(&descriptors);

        assert_eq!(resolution.cycles, vec![vec!["a", "b", "c", "a"]]);
        assert_eq!(resolution.rejected(), vec!["a", "b", "c"]);
        assert_eq!(resolution.order, vec!["d"]);
    }

    #[test]
    fn test_cycle_does_not_hide_unrelated_or_dependent_names() {
        let descriptors = set(&[
            ("storage", &[]),
            ("x", &["y"]),
            ("y", &["x"]),
            ("api", &["storage", "y"]),
        ]);
        let resolution = DependencyResolver::new().resolve(&descriptors);

        assert_eq!(resolution.order, vec!["storage", "api"]);
        assert_eq!(
            resolution.unsatisfied,
            vec![UnsatisfiedDependency {
                dependent: "api".into(),
                dependency: "y".into(),
                reason: UnsatisfiedReason::Cyclic,
            }]
        );
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let descriptors = set(&[("loop", &["loop"]), ("api", &[])]);
        let resolution = DependencyResolver::new().resolve(&descriptors);
        assert_eq!(resolution.cycles, vec![vec!["loop", "loop"]]);
        assert_eq!(resolution.order, vec!["api"]);
    }

    #[test]
    fn test_missing_dependency_reported_dependent_kept() {
        let descriptors = set(&[("api", &["auth", "storage"]), ("storage", &[])]);
        let resolution = DependencyResolver::new().resolve(&descriptors);

        assert_eq!(resolution.order, vec!["storage", "api"]);
        assert_eq!(resolution.unsatisfied.len(), 1);
        assert_eq!(resolution.unsatisfied[0].dependency, "auth");
        assert_eq!(resolution.unsatisfied[0].reason, UnsatisfiedReason::Missing);
    }

    #[test]
    fn test_empty_set() {
        let resolution = DependencyResolver::new().resolve(&DescriptorSet::new());
        assert!(resolution.order.is_empty());
        assert!(resolution.is_clean());
    }
}

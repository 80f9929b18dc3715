use std::fmt;

use serde::{Deserialize, Serialize};

/// The two plugin namespaces. Names never collide across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Module,
    Service,
}

impl PluginKind {
    pub const ALL: [PluginKind; 2] = [PluginKind::Service, PluginKind::Module];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Service => "service",
        }
    }

    /// Directory holding one sub-directory per plugin.
    pub fn dir(&self) -> &'static str {
        match self {
            Self::Module => "modules",
            Self::Service => "services",
        }
    }

    pub fn descriptor_file(&self) -> &'static str {
        match self {
            Self::Module => "module.json",
            Self::Service => "service.json",
        }
    }

    pub fn script_path(&self, name: &str) -> String {
        format!("{}/{name}/{name}.js", self.dir())
    }

    pub fn descriptor_path(&self, name: &str) -> String {
        format!("{}/{name}/{}", self.dir(), self.descriptor_file())
    }

    /// Only modules carry a view template.
    pub fn template_path(&self, name: &str) -> Option<String> {
        match self {
            Self::Module => Some(format!("modules/{name}/{name}.html")),
            Self::Service => None,
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

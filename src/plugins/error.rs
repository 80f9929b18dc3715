use super::PluginKind;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Descriptor for {kind} '{name}' not found at {path}")]
    DescriptorNotFound {
        kind: PluginKind,
        name: String,
        path: String,
    },

    #[error("Invalid descriptor for {kind} '{name}': {reason}")]
    InvalidDescriptor {
        kind: PluginKind,
        name: String,
        reason: String,
    },

    #[error("No {kind} factory registered for '{name}'")]
    MissingFactory { kind: PluginKind, name: String },

    #[error("Failed to instantiate {kind} '{name}': {message}")]
    Instantiate {
        kind: PluginKind,
        name: String,
        message: String,
    },

    #[error("Service '{name}' failed to initialize: {message}")]
    Init { name: String, message: String },

    #[error("Service '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

impl PluginError {
    pub fn instantiate(kind: PluginKind, name: impl Into<String>, message: impl ToString) -> Self {
        Self::Instantiate {
            kind,
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::DescriptorNotFound { name, .. }
            | Self::InvalidDescriptor { name, .. }
            | Self::MissingFactory { name, .. }
            | Self::Instantiate { name, .. }
            | Self::Init { name, .. }
            | Self::AlreadyRegistered { name } => name,
        }
    }
}

/// Renders a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::MissingFactory {
            kind: PluginKind::Module,
            name: "reports".into(),
        };
        assert_eq!(err.to_string(), "No module factory registered for 'reports'");

        let err = PluginError::Init {
            name: "api".into(),
            message: "endpoint unreachable".into(),
        };
        assert!(err.to_string().contains("endpoint unreachable"));
        assert_eq!(err.name(), "api");

        let err = PluginError::instantiate(PluginKind::Service, "theme", "boom");
        assert!(err.to_string().contains("service 'theme'"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "panicked");
    }
}

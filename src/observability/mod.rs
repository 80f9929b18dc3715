//! Tracing spans for the boot sequence and an optional subscriber setup.
//!
//! Enable the `subscriber` feature for a ready-made `fmt` subscriber:
//!
//! ```toml
//! modhost = { version = "0.1", features = ["subscriber"] }
//! ```

mod spans;

pub use spans::{SpanContext, Stage, StageSpan, navigate_span};

/// Installs a global `fmt` subscriber. `RUST_LOG` takes precedence over
/// `default_filter`.
#[cfg(feature = "subscriber")]
pub fn init_tracing(default_filter: &str) -> crate::Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| crate::Error::Config(format!("tracing subscriber: {e}")))
}

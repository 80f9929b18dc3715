//! Boots a host whose plugin artifacts are embedded in the binary.
//!
//! Run: RUST_LOG=modhost=debug cargo run --example static_host

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use modhost::prelude::*;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct ThemeService {
    dark: AtomicBool,
}

#[async_trait]
impl Service for ThemeService {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn init(&self, config: &Value) -> modhost::Result<()> {
        let dark = config.get("mode").and_then(Value::as_str) == Some("dark");
        self.dark.store(dark, Ordering::Relaxed);
        Ok(())
    }
}

struct HomePage {
    dark: bool,
}

impl Module for HomePage {
    fn on_mount(&mut self, region: &mut ContentRegion) {
        let mode = if self.dark { "dark" } else { "light" };
        region.push_html(&format!("<p>Theme: {mode}</p>"));
    }
}

#[derive(Default)]
struct SettingsPage;

impl Module for SettingsPage {
    fn title(&self) -> Option<&str> {
        Some("Preferences")
    }
}

#[tokio::main]
async fn main() -> modhost::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let transport = StaticTransport::new()
        .with_file("index.html", r##"<a href="#/home">Home</a><a href="#/settings">Settings</a>"##)
        .with_service("theme", Some(r#"{"config": {"mode": "dark"}}"#))
        .with_module("home", "<h1>Welcome</h1>", Some(r#"{"navOrder": 1}"#))
        .with_module(
            "settings",
            "<h1>Settings</h1>",
            Some(r#"{"requiredServices": ["theme"], "routes": [{"path": "/prefs", "redirectTo": "/settings"}]}"#),
        );

    let catalog = PluginCatalog::new()
        .service_default::<ThemeService>("theme")
        .module("home", |services| {
            let dark = services
                .get_as::<ThemeService>("theme")
                .is_some_and(|t| t.dark.load(Ordering::Relaxed));
            Ok(Box::new(HomePage { dark }) as Box<dyn Module>)
        })
        .module_default::<SettingsPage>("settings");

    let runtime = Runtime::builder()
        .transport(Arc::new(transport))
        .store(Arc::new(MemoryConfigProvider::new()))
        .catalog(catalog)
        .build()?;

    let mut shell = runtime.start("").await;
    println!("{}", shell.render_html());

    shell.navigate("#/prefs").await?;
    println!("{}", shell.render_html());

    Ok(())
}

use tokio::sync::mpsc;

use super::{BootReport, RuntimeContext};
use crate::registry::ServiceRegistry;
use crate::router::{NavigationError, Router, RouterState};

pub const APP_ERROR_MESSAGE: &str = "Failed to load application. Please try refreshing the page.";

/// What the host should display right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellView {
    /// `start` has not run yet.
    Loading,
    Content { module: String, html: String },
    NotFound { html: String },
    /// Nothing could be mounted. `retry` means a refresh may help.
    Error { message: String, retry: bool },
}

/// A booted runtime: context, router and navigation.
pub struct Shell {
    context: RuntimeContext,
    router: Router,
    report: BootReport,
    started: bool,
}

impl Shell {
    pub(crate) fn new(context: RuntimeContext, router: Router, report: BootReport) -> Self {
        Self {
            context,
            router,
            report,
            started: false,
        }
    }

    /// Resolves the initial location. Failures are logged and surface
    /// through [`Shell::view`].
    pub async fn start(&mut self, location: &str) {
        self.started = true;
        if self.router.modules().is_empty() {
            tracing::error!("No modules loaded, nothing to show");
            return;
        }
        if let Err(e) = self.router.navigate(location).await {
            tracing::error!(location, error = %e, "Initial navigation failed");
        }
    }

    pub async fn navigate(&mut self, token: &str) -> Result<&RouterState, NavigationError> {
        self.router.navigate(token).await
    }

    pub async fn serve(&mut self, events: mpsc::Receiver<String>) {
        self.router.serve(events).await;
    }

    pub fn view(&self) -> ShellView {
        if !self.started {
            return ShellView::Loading;
        }
        match self.router.state() {
            _ if self.router.modules().is_empty() => app_error(),
            RouterState::Mounted(module) => ShellView::Content {
                module: module.clone(),
                html: self.router.region().html().to_string(),
            },
            RouterState::NotFound => ShellView::NotFound {
                html: self.router.region().html().to_string(),
            },
            RouterState::Idle | RouterState::Unmounting(_) => app_error(),
        }
    }

    /// Navigation menu followed by the current view.
    pub fn render_html(&self) -> String {
        let body = match self.view() {
            ShellView::Loading => "<div class=\"loading\"></div>".to_string(),
            ShellView::Content { html, .. } | ShellView::NotFound { html } => html,
            ShellView::Error { message, .. } => format!(
                "<div class=\"app-error\"><p>{message}</p>\
                 <button data-action=\"retry\">Retry</button></div>"
            ),
        };
        format!(
            "<nav>{}</nav><main>{}</main>",
            self.router.nav().render_html(),
            body
        )
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    pub fn services(&self) -> &ServiceRegistry {
        self.context.services()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn report(&self) -> &BootReport {
        &self.report
    }

    /// Tears down the mounted module. Returns the last shown location.
    pub fn shutdown(mut self) -> Option<String> {
        let location = self.router.location().map(str::to_string);
        self.router.unmount_current();
        location
    }
}

fn app_error() -> ShellView {
    ShellView::Error {
        message: APP_ERROR_MESSAGE.to_string(),
        retry: true,
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("router", &self.router)
            .field("report", &self.report)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

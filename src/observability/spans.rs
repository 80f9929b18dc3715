//! Structured span definitions for boot stages and navigation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{Level, Span, field, span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovery,
    Services,
    Modules,
    Router,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Services => "services",
            Self::Modules => "modules",
            Self::Router => "router",
        }
    }
}

/// Numbers boots so spans from a refresh are distinguishable.
#[derive(Debug, Default)]
pub struct SpanContext {
    boot_id: AtomicU64,
}

impl SpanContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_boot_id(&self) -> u64 {
        self.boot_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn boot_span(&self) -> Span {
        let boot_id = self.next_boot_id();
        span!(Level::INFO, "modhost.boot", boot_id = boot_id)
    }
}

/// Span for one navigation; `module` is recorded once the route resolves.
pub fn navigate_span(location: &str) -> Span {
    span!(
        Level::DEBUG,
        "modhost.navigate",
        location = location,
        module = field::Empty,
    )
}

/// Times one boot stage and records how many items it produced.
pub struct StageSpan {
    span: Span,
    start: Instant,
}

impl StageSpan {
    pub fn new(stage: Stage) -> Self {
        let span = span!(
            Level::INFO,
            "modhost.stage",
            stage = stage.as_str(),
            items = field::Empty,
            elapsed_ms = field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn finish(self, items: usize) {
        self.span.record("items", items as u64);
        self.span
            .record("elapsed_ms", self.start.elapsed().as_millis() as u64);
        self.span.in_scope(|| tracing::debug!(items, "Stage complete"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_ids_increase() {
        let context = SpanContext::new();
        assert_eq!(context.next_boot_id(), 0);
        assert_eq!(context.next_boot_id(), 1);
    }

    #[test]
    fn test_stage_span() {
        let stage = StageSpan::new(Stage::Services);
        let _entered = stage.span().clone().entered();
        stage.finish(3);
        assert_eq!(Stage::Modules.as_str(), "modules");
    }
}

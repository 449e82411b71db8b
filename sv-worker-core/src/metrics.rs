use serde::Serialize;
use tracing::info;

use crate::contract::MetricsSink;

/// Events the sweep reports to the metrics sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricEvent {
    /// A user was handled: page published or folder unchanged.
    UserProcessed,
    /// Rendering or publishing a page failed; the next sweep retries.
    PageRenderError,
    /// A whole sweep finished.
    RunComplete,
}

impl MetricEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MetricEvent::UserProcessed => "user_processed",
            MetricEvent::PageRenderError => "page_render_error",
            MetricEvent::RunComplete => "run_complete",
        }
    }
}

/// Metrics sink that emits every event as a structured tracing event.
#[derive(Debug, Default, Clone)]
pub struct TracingMetrics {
    source: &'static str,
}

impl TracingMetrics {
    pub fn new(source: &'static str) -> Self {
        Self { source }
    }
}

impl MetricsSink for TracingMetrics {
    fn event(&self, event: MetricEvent) {
        info!(target: "sv_worker::metrics", source = self.source, event = event.name(), "metric event");
    }

    fn raw(&self, value: i64, name: &str) {
        info!(target: "sv_worker::metrics", source = self.source, name, value, "metric value");
    }
}

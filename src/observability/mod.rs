//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator and downstream client produce:
//!     → logging.rs (structured log records, trace-correlated)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (spans, W3C context propagation)
//!
//! Consumers:
//!     → stdout via tracing-subscriber (pretty or JSON)
//!     → GET /metrics (Prometheus scrape)
//!     → OTLP collector (gRPC)
//! ```
//!
//! # Design Decisions
//! - Sinks are injected as a `Telemetry` bundle, never looked up globally
//! - Metrics are cheap (atomic increments)
//! - Startup fails if the exporter or recorder cannot be built

pub mod logging;
pub mod memory;
pub mod metrics;
pub mod tracing;

use std::borrow::Cow;
use std::sync::Arc;

use opentelemetry::trace::SpanKind;
use opentelemetry_sdk::trace::SdkTracer;
use thiserror::Error;

pub use self::logging::{LogRecord, LogSink, Severity, TracingLogSink};
pub use self::metrics::{CallOutcome, MetricsSink, PrometheusMetrics, RequestStatus};
pub use self::tracing::{SpanScope, TraceContext, TracerGuard};

/// Errors raised while wiring observability at startup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to create OTLP exporter: {0}")]
    Exporter(String),

    #[error("failed to build metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Tracer, metrics sink and log sink handed to the request path.
#[derive(Clone)]
pub struct Telemetry {
    pub tracer: SdkTracer,
    pub metrics: Arc<dyn MetricsSink>,
    pub logs: Arc<dyn LogSink>,
}

impl Telemetry {
    pub fn new(tracer: SdkTracer, metrics: Arc<dyn MetricsSink>, logs: Arc<dyn LogSink>) -> Self {
        Self {
            tracer,
            metrics,
            logs,
        }
    }

    /// Start a span as a child of `parent`.
    pub fn span(
        &self,
        name: impl Into<Cow<'static, str>>,
        kind: SpanKind,
        parent: &TraceContext,
    ) -> SpanScope {
        SpanScope::start(&self.tracer, name, kind, parent)
    }

    pub fn log(&self, record: LogRecord) {
        self.logs.emit(record);
    }
}

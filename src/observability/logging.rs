//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem
//! - Carry trace/span ids on records emitted inside a traced operation
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and environment (`RUST_LOG` wins)

use std::fmt;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};
use crate::observability::tracing::TraceContext;

/// Install the global `tracing` subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// One structured log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            fields: Vec::new(),
            trace_id: None,
            span_id: None,
        }
    }

    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// Attach the trace and span ids of `cx`, if it holds a valid span.
    pub fn in_context(mut self, cx: &TraceContext) -> Self {
        self.trace_id = cx.trace_id();
        self.span_id = cx.span_id();
        self
    }

    /// Value of the first field named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Destination for log records. Emission is synchronous and never fails.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: LogRecord);
}

/// Forwards records to the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

/// Renders record fields as a JSON object so values with spaces or `=`
/// stay intact.
struct Fields<'a>(&'a [(&'static str, String)]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map: serde_json::Map<String, serde_json::Value> = self
            .0
            .iter()
            .map(|(key, value)| ((*key).to_string(), serde_json::Value::String(value.clone())))
            .collect();
        write!(f, "{}", serde_json::Value::Object(map))
    }
}

macro_rules! emit_at {
    ($level:ident, $record:expr) => {
        tracing::$level!(
            trace_id = $record.trace_id.as_deref().unwrap_or(""),
            span_id = $record.span_id.as_deref().unwrap_or(""),
            fields = %Fields(&$record.fields),
            "{}",
            $record.message
        )
    };
}

impl LogSink for TracingLogSink {
    fn emit(&self, record: LogRecord) {
        match record.severity {
            Severity::Debug => emit_at!(debug, record),
            Severity::Info => emit_at!(info, record),
            Severity::Warn => emit_at!(warn, record),
            Severity::Error => emit_at!(error, record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::memory::test_tracer;
    use crate::observability::tracing::SpanScope;
    use opentelemetry::trace::SpanKind;

    #[test]
    fn test_record_outside_trace_has_no_ids() {
        let record = LogRecord::new(Severity::Info, "hello")
            .field("user_id", "u1")
            .in_context(&TraceContext::none());
        assert_eq!(record.trace_id, None);
        assert_eq!(record.get("user_id"), Some("u1"));
        assert_eq!(Fields(&record.fields).to_string(), r#"{"user_id":"u1"}"#);
    }

    #[test]
    fn test_field_values_with_spaces_stay_structured() {
        let record = LogRecord::new(Severity::Warn, "failed")
            .field("error", "error sending request: connection refused")
            .field("ad_type", "a=b");
        let rendered = Fields(&record.fields).to_string();

        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["error"], "error sending request: connection refused");
        assert_eq!(parsed["ad_type"], "a=b");
        assert_eq!(parsed.as_object().map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_record_inside_span_carries_ids() {
        let (_provider, tracer, _exporter) = test_tracer();
        let span = SpanScope::start(&tracer, "op", SpanKind::Internal, &TraceContext::none());
        let cx = span.context();

        let record = LogRecord::new(Severity::Error, "failed").in_context(&cx);
        assert_eq!(record.trace_id, cx.trace_id());
        assert_eq!(record.span_id, cx.span_id());
        assert_eq!(record.trace_id.as_ref().map(String::len), Some(32));

        // No subscriber installed: emission is a no-op, not a panic.
        TracingLogSink.emit(record);
    }
}

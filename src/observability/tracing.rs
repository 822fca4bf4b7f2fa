//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract trace context from incoming requests
//! - Propagate trace context to downstream requests
//! - Create spans for each unit of work, ended on every exit path
//! - Export spans to an OTLP collector
//!
//! # Design Decisions
//! - The active context is passed explicitly as a `TraceContext` value;
//!   nothing reads an ambient "current span"
//! - W3C Trace Context (`traceparent`/`tracestate`) on the wire
//! - Spans are children of the context they were started from

use std::borrow::Cow;
use std::error::Error;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;

use crate::config::ObservabilityConfig;
use crate::observability::TelemetryError;

/// Immutable handle on a position in a trace.
///
/// Cloning is cheap. A context without a valid span (`TraceContext::none()`)
/// makes the next span a trace root.
#[derive(Clone, Debug, Default)]
pub struct TraceContext {
    cx: Context,
}

impl TraceContext {
    /// Context with no parent span.
    pub fn none() -> Self {
        Self { cx: Context::new() }
    }

    /// Continue a caller's trace from W3C trace-context headers. Missing or
    /// malformed headers yield a context with no parent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let cx = TraceContextPropagator::new()
            .extract_with_context(&Context::new(), &HeaderExtractor(headers));
        Self { cx }
    }

    /// Write this context as W3C trace-context headers.
    pub fn inject(&self, headers: &mut HeaderMap) {
        TraceContextPropagator::new().inject_context(&self.cx, &mut HeaderInjector(headers));
    }

    /// Hex trace id, if the context carries a valid span.
    pub fn trace_id(&self) -> Option<String> {
        let span = self.cx.span();
        let span_context = span.span_context();
        span_context
            .is_valid()
            .then(|| span_context.trace_id().to_string())
    }

    /// Hex span id, if the context carries a valid span.
    pub fn span_id(&self) -> Option<String> {
        let span = self.cx.span();
        let span_context = span.span_context();
        span_context
            .is_valid()
            .then(|| span_context.span_id().to_string())
    }
}

/// An active span. The span ends when the scope is dropped.
pub struct SpanScope {
    cx: Context,
}

impl SpanScope {
    /// Start a span named `name` as a child of `parent`.
    pub fn start(
        tracer: &SdkTracer,
        name: impl Into<Cow<'static, str>>,
        kind: SpanKind,
        parent: &TraceContext,
    ) -> Self {
        let span = tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(tracer, &parent.cx);
        Self {
            cx: parent.cx.with_span(span),
        }
    }

    /// Context to hand to child operations and outbound calls.
    pub fn context(&self) -> TraceContext {
        TraceContext {
            cx: self.cx.clone(),
        }
    }

    pub fn set_attribute(&self, attribute: KeyValue) {
        self.cx.span().set_attribute(attribute);
    }

    pub fn set_attributes(&self, attributes: impl IntoIterator<Item = KeyValue>) {
        self.cx.span().set_attributes(attributes);
    }

    /// Record `err` on the span and mark it failed with the error's message.
    pub fn fail(&self, err: &dyn Error) {
        let span = self.cx.span();
        span.record_error(err);
        span.set_status(Status::error(err.to_string()));
    }

    /// Mark the span failed without an error value.
    pub fn fail_with(&self, message: impl Into<Cow<'static, str>>) {
        self.cx.span().set_status(Status::error(message));
    }

    pub fn succeed(&self) {
        self.cx.span().set_status(Status::Ok);
    }
}

impl Drop for SpanScope {
    fn drop(&mut self) {
        self.cx.span().end();
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(key, error = %e, "Skipping trace header with invalid name");
                return;
            }
        };
        let value = match HeaderValue::from_str(&value) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key, error = %e, "Skipping trace header with invalid value");
                return;
            }
        };
        self.0.insert(name, value);
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Owns the tracer provider; flushes pending spans on `shutdown`.
pub struct TracerGuard {
    provider: SdkTracerProvider,
}

impl TracerGuard {
    pub fn tracer(&self, name: impl Into<Cow<'static, str>>) -> SdkTracer {
        self.provider.tracer(name)
    }

    /// Flush and stop the exporter.
    pub fn shutdown(self) {
        if let Err(e) = self.provider.shutdown() {
            tracing::error!(error = %e, "Failed to shutdown tracer provider");
        }
    }
}

/// Build the OTLP/gRPC span pipeline.
///
/// The collector is dialed over plaintext at `http://<authority>`.
pub fn init_tracer_provider(config: &ObservabilityConfig) -> Result<TracerGuard, TelemetryError> {
    let endpoint = format!("http://{}", config.collector_authority());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new(SERVICE_VERSION, config.service_version.clone()))
        .build();

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    tracing::info!(
        endpoint = %endpoint,
        service = %config.service_name,
        "OpenTelemetry tracing initialized"
    );

    Ok(TracerGuard { provider })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::memory::test_tracer;

    #[test]
    fn test_children_share_trace_and_nest() {
        let (_provider, tracer, exporter) = test_tracer();

        let root = SpanScope::start(&tracer, "root", SpanKind::Server, &TraceContext::none());
        let root_cx = root.context();
        {
            let child = SpanScope::start(&tracer, "child", SpanKind::Client, &root_cx);
            assert_eq!(child.context().trace_id(), root_cx.trace_id());
            assert_ne!(child.context().span_id(), root_cx.span_id());
            child.fail_with("boom");
        }
        root.succeed();
        drop(root);

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 2);
        let child = spans.iter().find(|s| s.name == "child").unwrap();
        let root = spans.iter().find(|s| s.name == "root").unwrap();
        assert_eq!(child.parent_span_id, root.span_context.span_id());
        assert_eq!(child.status, Status::error("boom"));
        assert_eq!(root.status, Status::Ok);
    }

    #[test]
    fn test_inject_then_extract_continues_trace() {
        let (_provider, tracer, _exporter) = test_tracer();
        let span = SpanScope::start(&tracer, "outbound", SpanKind::Client, &TraceContext::none());

        let mut headers = HeaderMap::new();
        span.context().inject(&mut headers);

        let traceparent = headers.get("traceparent").unwrap().to_str().unwrap();
        let trace_id = span.context().trace_id().unwrap();
        assert!(traceparent.starts_with(&format!("00-{trace_id}-")));

        let remote = TraceContext::from_headers(&headers);
        assert_eq!(remote.trace_id(), Some(trace_id));
        assert_eq!(remote.span_id(), span.context().span_id());
    }

    #[test]
    fn test_missing_headers_give_empty_context() {
        let cx = TraceContext::from_headers(&HeaderMap::new());
        assert_eq!(cx.trace_id(), None);

        let mut headers = HeaderMap::new();
        headers.insert("traceparent", HeaderValue::from_static("garbage"));
        assert_eq!(TraceContext::from_headers(&headers).span_id(), None);

        let mut out = HeaderMap::new();
        TraceContext::none().inject(&mut out);
        assert!(out.get("traceparent").is_none());
    }
}

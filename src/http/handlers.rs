//! Route handlers.
//!
//! Every handler that does traced work continues the caller's trace from
//! the inbound `traceparent` header.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use opentelemetry::trace::SpanKind;
use opentelemetry::KeyValue;
use serde_json::json;

use crate::ads::catalog;
use crate::ads::orchestrator::unix_now;
use crate::http::server::AppState;
use crate::observability::{LogRecord, Severity, TraceContext};

pub const SERVICE_NAME: &str = "ad-service";
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";
pub const PROPAGATION_MESSAGE: &str = "Trace context propagation test completed";

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

pub async fn list_ads(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let span = state.telemetry.span(
        "list_ads",
        SpanKind::Server,
        &TraceContext::from_headers(&headers),
    );
    span.set_attribute(KeyValue::new("handler", "list_ads"));
    let ads = catalog::list_ads();
    span.set_attribute(KeyValue::new("ads.count", ads.len() as i64));
    span.succeed();
    Json(ads)
}

/// `POST /ads/request`. The body is taken raw so a parse failure can be
/// counted and answered with a plain-text 400.
pub async fn request_ad(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let parent = TraceContext::from_headers(&headers);
    match state.orchestrator.handle_body(&parent, &body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Calls the analytics debug endpoint with this request's trace context and
/// reports the ids the callee should have seen.
pub async fn trace_propagation(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let span = state.telemetry.span(
        "test_trace_propagation",
        SpanKind::Server,
        &TraceContext::from_headers(&headers),
    );
    span.set_attribute(KeyValue::new("handler", "test_trace_propagation"));
    let cx = span.context();

    match state.orchestrator.downstream().fetch_debug_otel(&cx).await {
        Ok(analytics_response) => {
            span.succeed();
            let body = json!({
                "status": "success",
                "trace_id": cx.trace_id().unwrap_or_default(),
                "span_id": cx.span_id().unwrap_or_default(),
                "analytics_response": analytics_response,
                "message": PROPAGATION_MESSAGE,
                "timestamp": unix_now(),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            span.fail(&e);
            state.telemetry.log(
                LogRecord::new(Severity::Error, "Trace propagation test failed")
                    .field("error", &e)
                    .in_context(&cx),
            );
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

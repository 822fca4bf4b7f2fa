//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusRecorder;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ad_service::ads::AdOrchestrator;
use ad_service::config::{DownstreamConfig, ListenerConfig};
use ad_service::downstream::DownstreamClient;
use ad_service::http::{AppState, HttpServer};
use ad_service::lifecycle::Shutdown;
use ad_service::observability::memory::{InMemoryLogs, InMemoryMetrics};
use ad_service::observability::metrics::prometheus_builder;
use ad_service::observability::Telemetry;

/// How a mock dependency answers.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// 200 with this JSON body.
    Json(Value),
    /// This status with an empty body.
    Status(u16),
    /// This status with a JSON body.
    JsonWithStatus(u16, Value),
    /// 200 with a body that is not JSON.
    Garbage,
    /// Sleep, then answer 200 with this body.
    Slow(Duration, Value),
    /// 503 when the request path contains the marker, otherwise 200 with the body.
    FailWhenPathContains(&'static str, Value),
}

/// A running mock dependency and what it has seen.
#[derive(Clone)]
pub struct MockService {
    pub url: String,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub path: String,
    pub traceparent: Option<String>,
}

impl MockService {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

async fn mock_handler(State(state): State<MockState>, uri: Uri, headers: HeaderMap) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.seen.lock().unwrap().push(SeenRequest {
        path: uri.path().to_string(),
        traceparent: headers
            .get("traceparent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    match state.behavior {
        Behavior::Json(body) => Json(body).into_response(),
        Behavior::Status(code) => StatusCode::from_u16(code).unwrap().into_response(),
        Behavior::JsonWithStatus(code, body) => {
            (StatusCode::from_u16(code).unwrap(), Json(body)).into_response()
        }
        Behavior::Garbage => (StatusCode::OK, "not json at all").into_response(),
        Behavior::Slow(delay, body) => {
            tokio::time::sleep(delay).await;
            Json(body).into_response()
        }
        Behavior::FailWhenPathContains(marker, body) => {
            if uri.path().contains(marker) {
                StatusCode::SERVICE_UNAVAILABLE.into_response()
            } else {
                Json(body).into_response()
            }
        }
    }
}

/// Start a mock dependency on an ephemeral port. Every path is answered.
pub async fn start_mock_service(behavior: Behavior) -> MockService {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        behavior,
        hits: hits.clone(),
        seen: seen.clone(),
    };
    let router = Router::new().fallback(mock_handler).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    MockService {
        url: format!("http://{addr}"),
        hits,
        seen,
    }
}

/// A base URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn analytics_body(user_id: &str, click_rate: f64) -> Value {
    json!({
        "user_id": user_id,
        "click_rate": click_rate,
        "conversion_rate": 0.01,
        "total_impressions": 1000,
    })
}

pub fn bid_body(amount: f64) -> Value {
    json!({
        "bid_amount": amount,
        "bid_id": "b42",
        "strategy": "targeted",
    })
}

pub fn ad_request(user_id: &str, ad_type: &str) -> Value {
    json!({
        "user_id": user_id,
        "ad_type": ad_type,
        "timestamp": "t",
    })
}

/// The ad service running on an ephemeral port with in-memory telemetry.
pub struct TestApp {
    pub base_url: String,
    pub metrics: Arc<InMemoryMetrics>,
    pub logs: Arc<InMemoryLogs>,
    pub exporter: InMemorySpanExporter,
    pub recorder: PrometheusRecorder,
    pub shutdown: Shutdown,
    _provider: SdkTracerProvider,
}

impl TestApp {
    pub fn spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap()
    }

    pub fn span(&self, name: &str) -> Option<SpanData> {
        self.spans().into_iter().find(|s| s.name == name)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_app(analytics_url: &str, bidding_url: &str) -> TestApp {
    spawn_app_with_timeout(analytics_url, bidding_url, Duration::from_secs(5)).await
}

pub async fn spawn_app_with_timeout(
    analytics_url: &str,
    bidding_url: &str,
    timeout: Duration,
) -> TestApp {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let metrics = Arc::new(InMemoryMetrics::new());
    let logs = Arc::new(InMemoryLogs::new());
    let telemetry = Telemetry::new(
        provider.tracer("ad-service-it"),
        metrics.clone(),
        logs.clone(),
    );

    let downstream_config = DownstreamConfig {
        analytics_url: analytics_url.to_string(),
        bidding_url: bidding_url.to_string(),
        timeout_secs: timeout.as_secs().max(1),
    };
    let downstream =
        DownstreamClient::with_timeout(&downstream_config, timeout, telemetry.clone()).unwrap();

    let recorder = prometheus_builder().unwrap().build_recorder();
    let state = AppState {
        orchestrator: Arc::new(AdOrchestrator::new(downstream, telemetry.clone())),
        telemetry,
        metrics: recorder.handle(),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(state, &ListenerConfig::default());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestApp {
        base_url: format!("http://{addr}"),
        metrics,
        logs,
        exporter,
        recorder,
        shutdown,
        _provider: provider,
    }
}

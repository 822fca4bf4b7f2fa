//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ad_requests_total` (counter): requests by status, ad_type
//! - `ad_request_duration_seconds` (histogram): latency by ad_type
//! - `downstream_requests_total` (counter): outbound calls by service, outcome
//! - `downstream_request_duration_seconds` (histogram): outbound latency by service
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade (atomic operations)
//! - One Prometheus recorder per process, rendered by `GET /metrics`
//! - Histogram buckets are the usual web latency ladder, 5ms to 10s

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::downstream::Service;
use crate::observability::TelemetryError;

pub const AD_REQUESTS_TOTAL: &str = "ad_requests_total";
pub const AD_REQUEST_DURATION_SECONDS: &str = "ad_request_duration_seconds";
pub const DOWNSTREAM_REQUESTS_TOTAL: &str = "downstream_requests_total";
pub const DOWNSTREAM_REQUEST_DURATION_SECONDS: &str = "downstream_request_duration_seconds";

/// `ad_type` label used when the request could not be parsed.
pub const UNKNOWN_AD_TYPE: &str = "unknown";

pub const LATENCY_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Overall result of an inbound ad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    Error,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Success => "success",
            RequestStatus::Error => "error",
        }
    }
}

/// Result of a single outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    /// Failure, labelled with the error kind.
    Failure(&'static str),
}

impl CallOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Failure(kind) => kind,
        }
    }
}

/// Destination for request counters and latency observations.
///
/// Implementations must tolerate concurrent calls from many requests.
pub trait MetricsSink: Send + Sync {
    fn record_request(&self, status: RequestStatus, ad_type: &str);
    fn observe_request_duration(&self, ad_type: &str, seconds: f64);
    fn record_downstream_call(&self, service: Service, outcome: CallOutcome, seconds: f64);
}

/// Sink backed by the process-wide `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl MetricsSink for PrometheusMetrics {
    fn record_request(&self, status: RequestStatus, ad_type: &str) {
        counter!(
            AD_REQUESTS_TOTAL,
            "status" => status.as_str(),
            "ad_type" => ad_type.to_owned()
        )
        .increment(1);
    }

    fn observe_request_duration(&self, ad_type: &str, seconds: f64) {
        histogram!(AD_REQUEST_DURATION_SECONDS, "ad_type" => ad_type.to_owned()).record(seconds);
    }

    fn record_downstream_call(&self, service: Service, outcome: CallOutcome, seconds: f64) {
        counter!(
            DOWNSTREAM_REQUESTS_TOTAL,
            "service" => service.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        histogram!(DOWNSTREAM_REQUEST_DURATION_SECONDS, "service" => service.as_str())
            .record(seconds);
    }
}

/// Prometheus builder with the latency buckets applied to both histograms.
pub fn prometheus_builder() -> Result<PrometheusBuilder, TelemetryError> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(AD_REQUEST_DURATION_SECONDS.to_string()),
            &LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(DOWNSTREAM_REQUEST_DURATION_SECONDS.to_string()),
            &LATENCY_BUCKETS,
        )?;
    Ok(builder)
}

/// Install the global recorder and return the handle used to render `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle, TelemetryError> {
    let handle = prometheus_builder()?.install_recorder()?;
    describe_metrics();
    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

/// Register help text for every metric.
pub fn describe_metrics() {
    describe_counter!(AD_REQUESTS_TOTAL, Unit::Count, "Total number of ad requests");
    describe_histogram!(
        AD_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of ad requests"
    );
    describe_counter!(
        DOWNSTREAM_REQUESTS_TOTAL,
        Unit::Count,
        "Outbound calls to analytics and bidding by outcome"
    );
    describe_histogram!(
        DOWNSTREAM_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of outbound calls to analytics and bidding"
    );
}

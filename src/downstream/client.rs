//! HTTP client for the analytics and bidding services.
//!
//! # Responsibilities
//! - Build requests against the configured base URLs
//! - Carry the caller's trace context as `traceparent`/`tracestate` headers
//! - Enforce the shared outbound timeout
//! - Classify failures (transport, status, decode)
//! - Emit one span, one metric and one log record per call

use std::time::{Duration, Instant};

use http::HeaderMap;
use opentelemetry::trace::SpanKind;
use opentelemetry::KeyValue;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use crate::ads::types::{AdRequest, BidResponse, UserAnalytics};
use crate::config::DownstreamConfig;
use crate::downstream::error::{DownstreamError, DownstreamResult};
use crate::downstream::{Downstream, Service};
use crate::observability::{
    CallOutcome, LogRecord, Severity, SpanScope, Telemetry, TraceContext,
};

/// Client for both dependencies. Cheap to share behind an `Arc`; the inner
/// `reqwest::Client` keeps connections alive between requests.
#[derive(Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    analytics_base: Url,
    bidding_base: Url,
    timeout: Duration,
    telemetry: Telemetry,
}

impl DownstreamClient {
    /// Create a client using the configured timeout.
    pub fn new(config: &DownstreamConfig, telemetry: Telemetry) -> DownstreamResult<Self> {
        Self::with_timeout(config, Duration::from_secs(config.timeout_secs), telemetry)
    }

    /// Create a client with an explicit overall timeout per call.
    pub fn with_timeout(
        config: &DownstreamConfig,
        timeout: Duration,
        telemetry: Telemetry,
    ) -> DownstreamResult<Self> {
        let analytics_base = parse_base(Service::Analytics, &config.analytics_url)?;
        let bidding_base = parse_base(Service::Bidding, &config.bidding_url)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| DownstreamError::Client { source })?;

        tracing::info!(
            analytics_url = %analytics_base,
            bidding_url = %bidding_base,
            timeout_secs = timeout.as_secs_f64(),
            "Downstream client initialized"
        );

        Ok(Self {
            http,
            analytics_base,
            bidding_base,
            timeout,
            telemetry,
        })
    }

    /// Call the analytics debug endpoint, which echoes its view of the trace.
    ///
    /// The endpoint reports collector problems as a JSON body with a 5xx
    /// status, so any status is accepted as long as the body decodes.
    pub async fn fetch_debug_otel(&self, parent: &TraceContext) -> DownstreamResult<Map<String, Value>> {
        let span = self
            .telemetry
            .span("test.analytics_call", SpanKind::Client, parent);
        let url = self.endpoint(Service::Analytics, &["analytics", "debug", "otel"]);
        self.call(&span, Service::Analytics, Method::GET, url, None, StatusCheck::Any)
            .await
    }

    fn endpoint(&self, service: Service, segments: &[&str]) -> DownstreamResult<Url> {
        let mut url = match service {
            Service::Analytics => self.analytics_base.clone(),
            Service::Bidding => self.bidding_base.clone(),
        };
        url.path_segments_mut()
            .map_err(|()| DownstreamError::InvalidUrl {
                service,
                reason: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue one request inside `span` and record its outcome.
    async fn call<T: DeserializeOwned>(
        &self,
        span: &SpanScope,
        service: Service,
        method: Method,
        url: DownstreamResult<Url>,
        body: Option<&AdRequest>,
        check: StatusCheck,
    ) -> DownstreamResult<T> {
        let started = Instant::now();
        let result = match url {
            Ok(url) => {
                span.set_attributes([
                    KeyValue::new("http.method", method.to_string()),
                    KeyValue::new("http.url", url.to_string()),
                ]);
                let mut request = self.http.request(method, url);
                if let Some(body) = body {
                    request = request.json(body);
                }
                self.execute(span, service, request, check).await
            }
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed();
        span.set_attribute(KeyValue::new(
            "http.duration_ms",
            elapsed.as_secs_f64() * 1000.0,
        ));

        let cx = span.context();
        match &result {
            Ok(_) => {
                span.succeed();
                self.telemetry.metrics.record_downstream_call(
                    service,
                    CallOutcome::Success,
                    elapsed.as_secs_f64(),
                );
                self.telemetry.log(
                    LogRecord::new(Severity::Debug, "Downstream call succeeded")
                        .field("service", service)
                        .field("duration_ms", elapsed.as_millis())
                        .in_context(&cx),
                );
            }
            Err(e) => {
                span.fail(e);
                span.set_attribute(KeyValue::new("error.kind", e.kind()));
                self.telemetry.metrics.record_downstream_call(
                    service,
                    CallOutcome::Failure(e.kind()),
                    elapsed.as_secs_f64(),
                );
                self.telemetry.log(
                    LogRecord::new(Severity::Error, "Downstream call failed")
                        .field("service", service)
                        .field("error.kind", e.kind())
                        .field("error", e)
                        .in_context(&cx),
                );
            }
        }

        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        span: &SpanScope,
        service: Service,
        request: reqwest::RequestBuilder,
        check: StatusCheck,
    ) -> DownstreamResult<T> {
        let mut headers = HeaderMap::new();
        span.context().inject(&mut headers);

        let response = request
            .headers(headers)
            .send()
            .await
            .map_err(|source| DownstreamError::Transport { service, source })?;

        let status = response.status();
        span.set_attribute(KeyValue::new("http.status_code", i64::from(status.as_u16())));
        if check == StatusCheck::OkOnly && status != StatusCode::OK {
            return Err(DownstreamError::Status {
                service,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| DownstreamError::Transport { service, source })?;
        serde_json::from_slice(&body).map_err(|source| DownstreamError::Decode { service, source })
    }
}

impl Downstream for DownstreamClient {
    async fn fetch_analytics(
        &self,
        parent: &TraceContext,
        user_id: &str,
    ) -> DownstreamResult<UserAnalytics> {
        let span = self
            .telemetry
            .span("get_user_analytics", SpanKind::Client, parent);
        span.set_attribute(KeyValue::new("user_id", user_id.to_string()));

        let url = self.endpoint(Service::Analytics, &["analytics", "user", user_id]);
        let analytics: UserAnalytics = self
            .call(&span, Service::Analytics, Method::GET, url, None, StatusCheck::OkOnly)
            .await?;

        span.set_attributes([
            KeyValue::new("analytics.click_rate", analytics.click_rate),
            KeyValue::new("analytics.conversion_rate", analytics.conversion_rate),
            KeyValue::new(
                "analytics.total_impressions",
                i64::try_from(analytics.total_impressions).unwrap_or(i64::MAX),
            ),
        ]);
        Ok(analytics)
    }

    async fn fetch_bid(&self, parent: &TraceContext, request: &AdRequest) -> DownstreamResult<BidResponse> {
        let span = self.telemetry.span("get_bid", SpanKind::Client, parent);
        span.set_attributes([
            KeyValue::new("user_id", request.user_id.clone()),
            KeyValue::new("ad_type", request.ad_type.clone()),
        ]);

        let url = self.endpoint(Service::Bidding, &["bidding", "calculate"]);
        let bid: BidResponse = self
            .call(&span, Service::Bidding, Method::POST, url, Some(request), StatusCheck::OkOnly)
            .await?;

        span.set_attributes([
            KeyValue::new("bid_amount", bid.bid_amount),
            KeyValue::new("bid.strategy", bid.strategy.clone()),
        ]);
        Ok(bid)
    }
}

/// Which response statuses count as a usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusCheck {
    /// Anything but 200 is a `Status` error.
    OkOnly,
    /// Decode the body whatever the status.
    Any,
}

fn parse_base(service: Service, value: &str) -> DownstreamResult<Url> {
    Url::parse(value).map_err(|e| DownstreamError::InvalidUrl {
        service,
        reason: format!("'{value}': {e}"),
    })
}

impl std::fmt::Debug for DownstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownstreamClient")
            .field("analytics_base", &self.analytics_base.as_str())
            .field("bidding_base", &self.bidding_base.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

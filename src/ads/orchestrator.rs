//! Ad request orchestration.
//!
//! Drives the analytics and bidding calls for one request, substitutes a
//! fallback for whichever dependency fails, and composes the response.
//! Downstream failures never reach the caller; only an unparsable body does.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use opentelemetry::trace::SpanKind;
use opentelemetry::KeyValue;
use thiserror::Error;

use crate::ads::fallback::{fallback_analytics, fallback_bid};
use crate::ads::types::{AdRequest, AdResponse, BidResponse, UserAnalytics};
use crate::downstream::{Downstream, DownstreamClient};
use crate::observability::metrics::UNKNOWN_AD_TYPE;
use crate::observability::{LogRecord, RequestStatus, Severity, SpanScope, Telemetry, TraceContext};

/// Message returned on every composed response, fallbacks included.
pub const SUCCESS_MESSAGE: &str = "Ad request processed successfully";

/// Rejection of the inbound request itself.
#[derive(Debug, Error)]
pub enum AdRequestError {
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),

    #[error("empty request body")]
    Empty,
}

/// Decode the first JSON value in `body`. Bytes after it are ignored and
/// missing fields default to empty strings.
pub fn parse_request(body: &[u8]) -> Result<AdRequest, AdRequestError> {
    match serde_json::Deserializer::from_slice(body)
        .into_iter::<AdRequest>()
        .next()
    {
        Some(parsed) => Ok(parsed?),
        None => Err(AdRequestError::Empty),
    }
}

/// Central request handler.
pub struct AdOrchestrator<D = DownstreamClient> {
    downstream: D,
    telemetry: Telemetry,
}

impl<D: Downstream> AdOrchestrator<D> {
    pub fn new(downstream: D, telemetry: Telemetry) -> Self {
        Self {
            downstream,
            telemetry,
        }
    }

    pub fn downstream(&self) -> &D {
        &self.downstream
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Parse a raw request body and handle it.
    ///
    /// An unparsable body is counted as `status="error", ad_type="unknown"`
    /// and rejected before any dependency is called.
    pub async fn handle_body(
        &self,
        parent: &TraceContext,
        body: &[u8],
    ) -> Result<AdResponse, AdRequestError> {
        let started = Instant::now();
        let span = self.start_span(parent);

        let request = match parse_request(body) {
            Ok(request) => request,
            Err(e) => {
                self.telemetry
                    .metrics
                    .record_request(RequestStatus::Error, UNKNOWN_AD_TYPE);
                span.fail(&e);
                self.telemetry.log(
                    LogRecord::new(Severity::Warn, "Rejected malformed ad request")
                        .field("error", &e)
                        .in_context(&span.context()),
                );
                return Err(e);
            }
        };

        Ok(self.respond(&span, request, started).await)
    }

    /// Handle an already-parsed request. Never fails.
    pub async fn handle(&self, parent: &TraceContext, request: AdRequest) -> AdResponse {
        let started = Instant::now();
        let span = self.start_span(parent);
        self.respond(&span, request, started).await
    }

    fn start_span(&self, parent: &TraceContext) -> SpanScope {
        let span = self.telemetry.span("request_ad", SpanKind::Server, parent);
        span.set_attribute(KeyValue::new("handler", "request_ad"));
        span
    }

    async fn respond(&self, span: &SpanScope, request: AdRequest, started: Instant) -> AdResponse {
        let cx = span.context();
        span.set_attributes([
            KeyValue::new("user_id", request.user_id.clone()),
            KeyValue::new("ad_type", request.ad_type.clone()),
        ]);

        let analytics = self.analytics_or_fallback(span, &request).await;
        let bid = self.bid_or_fallback(span, &request).await;

        let response = compose_response(&request, &analytics, &bid, unix_now());

        let elapsed = started.elapsed().as_secs_f64();
        self.telemetry
            .metrics
            .record_request(RequestStatus::Success, &request.ad_type);
        self.telemetry
            .metrics
            .observe_request_duration(&request.ad_type, elapsed);

        span.set_attributes([
            KeyValue::new("bid_amount", bid.bid_amount),
            KeyValue::new("request_duration_seconds", elapsed),
            KeyValue::new("response.message", SUCCESS_MESSAGE),
        ]);
        self.telemetry.log(
            LogRecord::new(Severity::Info, "Ad request processed")
                .field("ad_id", &response.ad_id)
                .field("ad_type", &request.ad_type)
                .field("bid_amount", bid.bid_amount)
                .field("duration_seconds", elapsed)
                .in_context(&cx),
        );
        span.succeed();

        response
    }

    async fn analytics_or_fallback(&self, span: &SpanScope, request: &AdRequest) -> UserAnalytics {
        let cx = span.context();
        match self.downstream.fetch_analytics(&cx, &request.user_id).await {
            Ok(analytics) => {
                span.set_attribute(KeyValue::new("analytics.fallback", false));
                analytics
            }
            Err(e) => {
                self.telemetry.log(
                    LogRecord::new(Severity::Error, "Error getting user analytics")
                        .field("error", &e)
                        .field("error.kind", e.kind())
                        .field("user_id", &request.user_id)
                        .in_context(&cx),
                );
                span.fail(&e);
                span.set_attribute(KeyValue::new("analytics.fallback", true));
                fallback_analytics(&request.user_id)
            }
        }
    }

    async fn bid_or_fallback(&self, span: &SpanScope, request: &AdRequest) -> BidResponse {
        let cx = span.context();
        match self.downstream.fetch_bid(&cx, request).await {
            Ok(bid) => {
                span.set_attribute(KeyValue::new("bid.fallback", false));
                bid
            }
            Err(e) => {
                let bid = fallback_bid();
                self.telemetry.log(
                    LogRecord::new(Severity::Error, "Error getting bid")
                        .field("error", &e)
                        .field("error.kind", e.kind())
                        .field("bid_id", &bid.bid_id)
                        .field("strategy", &bid.strategy)
                        .in_context(&cx),
                );
                span.fail(&e);
                span.set_attributes([
                    KeyValue::new("bid.fallback", true),
                    KeyValue::new("bid.strategy", bid.strategy.clone()),
                ]);
                bid
            }
        }
    }
}

/// Build the response. `ad_id` embeds `unix_secs`, so it is only unique per
/// ad type per second.
pub fn compose_response(
    request: &AdRequest,
    analytics: &UserAnalytics,
    bid: &BidResponse,
    unix_secs: u64,
) -> AdResponse {
    AdResponse {
        ad_id: format!("ad_{}_{}", request.ad_type, unix_secs),
        ad_type: request.ad_type.clone(),
        bid_amount: bid.bid_amount,
        user_data: format!(
            "User analytics: {:.2}% click rate",
            analytics.click_rate * 100.0
        ),
        message: SUCCESS_MESSAGE.to_string(),
    }
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

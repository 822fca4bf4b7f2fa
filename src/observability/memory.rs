//! In-memory sinks.
//!
//! Record every metric observation and log record so tests (and embedders
//! without a Prometheus registry) can inspect what the core emitted.

use std::sync::{Mutex, PoisonError};

use crate::downstream::Service;
use crate::observability::logging::{LogRecord, LogSink};
use crate::observability::metrics::{CallOutcome, MetricsSink, RequestStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    Request {
        status: RequestStatus,
        ad_type: String,
    },
    RequestDuration {
        ad_type: String,
        seconds: f64,
    },
    DownstreamCall {
        service: Service,
        outcome: CallOutcome,
        seconds: f64,
    },
}

#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    events: Mutex<Vec<MetricEvent>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<MetricEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `ad_requests_total` increments for the label pair.
    pub fn request_count(&self, status: RequestStatus, ad_type: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MetricEvent::Request { status: s, ad_type: t } if *s == status && t == ad_type))
            .count()
    }

    /// Outcomes of outbound calls to `service`, in call order.
    pub fn downstream_outcomes(&self, service: Service) -> Vec<CallOutcome> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                MetricEvent::DownstreamCall { service: s, outcome, .. } if *s == service => Some(*outcome),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: MetricEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_request(&self, status: RequestStatus, ad_type: &str) {
        self.push(MetricEvent::Request {
            status,
            ad_type: ad_type.to_string(),
        });
    }

    fn observe_request_duration(&self, ad_type: &str, seconds: f64) {
        self.push(MetricEvent::RequestDuration {
            ad_type: ad_type.to_string(),
            seconds,
        });
    }

    fn record_downstream_call(&self, service: Service, outcome: CallOutcome, seconds: f64) {
        self.push(MetricEvent::DownstreamCall {
            service,
            outcome,
            seconds,
        });
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLogs {
    records: Mutex<Vec<LogRecord>>,
}

impl InMemoryLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// First record whose message equals `message`.
    pub fn find(&self, message: &str) -> Option<LogRecord> {
        self.records().into_iter().find(|r| r.message == message)
    }
}

impl LogSink for InMemoryLogs {
    fn emit(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

#[cfg(test)]
pub(crate) use test_support::test_tracer;

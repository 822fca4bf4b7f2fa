//! Downstream dependency subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator
//!     → Downstream::fetch_analytics  (GET  {analytics}/analytics/user/{id})
//!     → Downstream::fetch_bid        (POST {bidding}/bidding/calculate)
//!         span per call, traceparent header injected,
//!         shared timeout, one metric + one log record on outcome
//! ```
//!
//! # Design Decisions
//! - No retries: one failed attempt is reported straight back
//! - Transport, status and decode failures share one error type

pub mod client;
pub mod error;

use std::fmt;
use std::future::Future;

use crate::ads::types::{AdRequest, BidResponse, UserAnalytics};
use crate::observability::TraceContext;

pub use client::DownstreamClient;
pub use error::{DownstreamError, DownstreamResult};

/// Dependency a call is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Analytics,
    Bidding,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Analytics => "analytics",
            Service::Bidding => "bidding",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two calls the orchestrator depends on.
///
/// Each call starts its own span as a child of `parent`.
pub trait Downstream: Send + Sync + 'static {
    fn fetch_analytics(
        &self,
        parent: &TraceContext,
        user_id: &str,
    ) -> impl Future<Output = DownstreamResult<UserAnalytics>> + Send;

    fn fetch_bid(
        &self,
        parent: &TraceContext,
        request: &AdRequest,
    ) -> impl Future<Output = DownstreamResult<BidResponse>> + Send;
}

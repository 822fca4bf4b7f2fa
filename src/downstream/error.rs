//! Downstream failure taxonomy.

use thiserror::Error;

use crate::downstream::Service;

/// Errors that can occur while calling a dependency.
///
/// The orchestrator treats every variant the same way (substitute the
/// fallback); the variants only matter for logs, span attributes and metrics.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// DNS, connect, timeout or body read failure.
    #[error("{service} request failed: {source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    /// Any status other than 200.
    #[error("{service} service returned status: {status}")]
    Status { service: Service, status: u16 },

    /// The body was not the expected JSON shape.
    #[error("{service} response could not be decoded: {source}")]
    Decode {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    /// The request URL could not be built from the configured base.
    #[error("invalid {service} url: {reason}")]
    InvalidUrl { service: Service, reason: String },
}

impl DownstreamError {
    /// Short label used for the `outcome` metric label and `error.kind` attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            DownstreamError::Transport { .. } => "transport",
            DownstreamError::Status { .. } => "status",
            DownstreamError::Decode { .. } => "decode",
            DownstreamError::Client { .. } => "client",
            DownstreamError::InvalidUrl { .. } => "url",
        }
    }
}

/// Result type for downstream calls.
pub type DownstreamResult<T> = Result<T, DownstreamError>;

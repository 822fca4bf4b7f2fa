//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! Every field can be set by flag or environment variable; the defaults match
//! a local development stack (analytics on :3000, bidding on :3001, collector
//! on :4317).

use clap::{Args, Parser, ValueEnum};
use serde::Serialize;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_ANALYTICS_URL: &str = "http://localhost:3000";
pub const DEFAULT_BIDDING_URL: &str = "http://localhost:3001";
pub const DEFAULT_DOWNSTREAM_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_OTLP_ENDPOINT: &str = "localhost:4317";
pub const DEFAULT_SERVICE_NAME: &str = "ad-service";
pub const DEFAULT_SERVICE_VERSION: &str = "1.0.0";
pub const DEFAULT_LOG_LEVEL: &str = "ad_service=info,tower_http=info";

/// Root configuration for the ad service.
#[derive(Debug, Clone, Default, Parser, Serialize)]
#[command(name = "ad-service", version, about = "Ad request edge service")]
pub struct ServiceConfig {
    /// Inbound listener settings.
    #[command(flatten)]
    pub listener: ListenerConfig,

    /// Analytics and bidding dependencies.
    #[command(flatten)]
    pub downstream: DownstreamConfig,

    /// Logging and trace export.
    #[command(flatten)]
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Args, Serialize)]
pub struct ListenerConfig {
    /// Port to listen on (all interfaces).
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Inbound request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl ListenerConfig {
    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Downstream service configuration.
#[derive(Debug, Clone, Args, Serialize)]
pub struct DownstreamConfig {
    /// Base URL of the analytics service.
    #[arg(long = "analytics-url", env = "ANALYTICS_SERVICE_URL", default_value = DEFAULT_ANALYTICS_URL)]
    pub analytics_url: String,

    /// Base URL of the bidding service.
    #[arg(long = "bidding-url", env = "BIDDING_SERVICE_URL", default_value = DEFAULT_BIDDING_URL)]
    pub bidding_url: String,

    /// Overall timeout applied to every outbound call, in seconds.
    #[arg(long = "downstream-timeout-secs", env = "DOWNSTREAM_TIMEOUT_SECS", default_value_t = DEFAULT_DOWNSTREAM_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            analytics_url: DEFAULT_ANALYTICS_URL.to_string(),
            bidding_url: DEFAULT_BIDDING_URL.to_string(),
            timeout_secs: DEFAULT_DOWNSTREAM_TIMEOUT_SECS,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Args, Serialize)]
pub struct ObservabilityConfig {
    /// OTLP/gRPC collector endpoint. A leading `http://` or `https://` is ignored.
    #[arg(long = "otlp-endpoint", env = "OTEL_EXPORTER_OTLP_ENDPOINT", default_value = DEFAULT_OTLP_ENDPOINT)]
    pub otlp_endpoint: String,

    /// Service name reported on every span.
    #[arg(long = "service-name", env = "OTEL_SERVICE_NAME", default_value = DEFAULT_SERVICE_NAME)]
    pub service_name: String,

    /// Service version reported on every span.
    #[arg(long = "service-version", env = "SERVICE_VERSION", default_value = DEFAULT_SERVICE_VERSION)]
    pub service_version: String,

    /// Log filter directive, used when `RUST_LOG` is unset.
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Log output format.
    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl ObservabilityConfig {
    /// Collector `host:port` with any scheme prefix and trailing slash removed.
    pub fn collector_authority(&self) -> &str {
        let endpoint = self.otlp_endpoint.trim();
        let endpoint = endpoint
            .strip_prefix("http://")
            .or_else(|| endpoint.strip_prefix("https://"))
            .unwrap_or(endpoint);
        endpoint.trim_end_matches('/')
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

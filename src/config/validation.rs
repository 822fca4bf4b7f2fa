//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntactic)
//! - Downstream base URLs must be absolute http(s) URLs
//! - Timeouts and limits must be non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: unsupported scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { field: &'static str, scheme: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("downstream.analytics_url", &config.downstream.analytics_url),
        ("downstream.bidding_url", &config.downstream.bidding_url),
    ] {
        if let Err(e) = check_base_url(field, value) {
            errors.push(e);
        }
    }

    if config.downstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "downstream.timeout_secs" });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "listener.request_timeout_secs" });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_bytes" });
    }
    if config.observability.collector_authority().is_empty() {
        errors.push(ValidationError::Empty { field: "observability.otlp_endpoint" });
    }
    if config.observability.service_name.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "observability.service_name" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let url = Url::parse(value).map_err(|e| ValidationError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ValidationError::UnsupportedScheme {
            field,
            scheme: other.to_string(),
        }),
    }
}

//! Configuration loading from the environment and command line.

use std::ffi::OsString;

use clap::Parser;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Argument error: {0}")]
    Args(#[from] clap::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ServiceConfig {
    /// Load and validate configuration from the process arguments and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(std::env::args_os())
    }

    /// Load and validate configuration from explicit arguments (the first item
    /// is the program name). Environment variables still apply.
    pub fn load_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::try_parse_from(args)?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! argv + environment (PORT, ANALYTICS_SERVICE_URL, ...)
//!     → loader.rs (clap parse with env fallbacks)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed by value to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup; there is no reload
//! - All fields have defaults so the service runs with an empty environment
//! - Validation separates syntactic (clap) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{DownstreamConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig};
pub use validation::ValidationError;

//! Ad request edge service library.

pub mod ads;
pub mod config;
pub mod downstream;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use ads::AdOrchestrator;
pub use config::ServiceConfig;
pub use downstream::DownstreamClient;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Telemetry;

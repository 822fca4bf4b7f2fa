//! Ad Service
//!
//! An ad-request edge service built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 AD SERVICE                   │
//!   Client Request   │  ┌─────────┐    ┌──────────────┐             │
//!   ─────────────────┼─▶│  http   │───▶│ orchestrator │             │
//!                    │  │ server  │    │  (fallbacks) │             │
//!                    │  └─────────┘    └──────┬───────┘             │
//!                    │                        │ traceparent          │
//!                    │                        ▼                      │
//!   Client Response  │                 ┌──────────────┐             │   Analytics
//!   ◀────────────────┼──────────────── │  downstream  │◀───────────┼── Bidding
//!                    │                 │    client    │             │
//!                    │                 └──────────────┘             │
//!                    │  ┌────────────────────────────────────────┐  │
//!                    │  │         Cross-Cutting Concerns          │  │
//!                    │  │  config · observability · lifecycle    │  │
//!                    │  └────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::net::TcpListener;

use ad_service::ads::AdOrchestrator;
use ad_service::config::{ConfigError, ServiceConfig};
use ad_service::downstream::DownstreamClient;
use ad_service::http::{AppState, HttpServer};
use ad_service::lifecycle::{wait_for_signal, Shutdown};
use ad_service::observability::logging::init_logging;
use ad_service::observability::metrics::install_recorder;
use ad_service::observability::tracing::init_tracer_provider;
use ad_service::observability::{PrometheusMetrics, Telemetry, TracingLogSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match ServiceConfig::load() {
        Ok(config) => config,
        // --help, --version and usage errors print themselves.
        Err(ConfigError::Args(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    init_logging(&config.observability);

    tracing::info!(
        version = %config.observability.service_version,
        "ad-service starting"
    );
    tracing::info!(
        port = config.listener.port,
        analytics_url = %config.downstream.analytics_url,
        bidding_url = %config.downstream.bidding_url,
        downstream_timeout_secs = config.downstream.timeout_secs,
        otlp_endpoint = %config.observability.otlp_endpoint,
        "Configuration loaded"
    );

    let metrics = install_recorder()?;
    let tracer_guard = init_tracer_provider(&config.observability)?;

    let telemetry = Telemetry::new(
        tracer_guard.tracer(config.observability.service_name.clone()),
        Arc::new(PrometheusMetrics),
        Arc::new(TracingLogSink),
    );
    let downstream = DownstreamClient::new(&config.downstream, telemetry.clone())?;
    let orchestrator = Arc::new(AdOrchestrator::new(downstream, telemetry.clone()));

    let state = AppState {
        orchestrator,
        telemetry,
        metrics,
    };

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(wait_for_signal(shutdown));

    let server = HttpServer::new(state, &config.listener);
    let result = server.run(listener, shutdown_rx).await;

    tracer_guard.shutdown();
    tracing::info!("Shutdown complete");
    result.map_err(Into::into)
}

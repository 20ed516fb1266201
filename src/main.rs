//! Catalog service
//!
//! Serves a product catalog over HTTP with trace propagation and a latency
//! injection control for exercising caller timeouts.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────┐
//!     ────────────────────┼─▶ http::server (request id, access log)      │
//!                         │        │                                      │
//!                         │        ▼                                      │
//!                         │   catalog::handlers ──▶ admin::latency (sleep)│
//!                         │        │                                      │
//!                         │        ▼                                      │
//!                         │   store::ProductStore                         │
//!                         │        │                                      │
//!     Client Response     │        ▼                                      │
//!     ◀───────────────────┼── http::response envelope                     │
//!                         │                                               │
//!                         │   observability: logs, metrics, spans         │
//!                         └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! catalog-service --config catalog.toml
//! ```
//!
//! Environment variables:
//! - `CATALOG_VERSION`: version reported by `/liveness` (default `v1`)
//! - `SERVICE_NAME`: service name reported by `/liveness`
//! - `CATALOG_PORT`: port to listen on
//! - `CATALOG_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: log filter, overrides the configured level

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use catalog_service::config;
use catalog_service::lifecycle::startup;
use catalog_service::observability::logging::init_logging;
use catalog_service::store::MemoryStore;

#[derive(Parser)]
#[command(name = "catalog-service")]
#[command(about = "Product catalog HTTP service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::load(args.config.as_deref())?;
    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        service = %config.service.name,
        service_version = %config.service.version,
        tracer = ?config.observability.tracer,
        initial_latency_ms = config.latency.initial_ms,
        "Configuration loaded"
    );

    let store = Arc::new(MemoryStore::new());
    startup::run(config, store).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

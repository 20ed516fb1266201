//! Startup orchestration.
//!
//! Order: metrics exporter → listener → HTTP server. Any failure before the
//! listener is bound is fatal.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::CatalogConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::observability::tracing::tracer_for;
use crate::store::ProductStore;

/// Run the service against `store` until a termination signal arrives.
pub async fn run(
    config: CatalogConfig,
    store: Arc<dyn ProductStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let tracer = tracer_for(config.observability.tracer);
    let server = HttpServer::new(config, store, tracer);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;
    Ok(())
}

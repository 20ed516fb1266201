//! Metrics collection and exposition.
//!
//! # Metrics
//! - `catalog_requests_total` (counter): requests by operation, status
//! - `catalog_request_duration_seconds` (histogram): handler latency,
//!   including any injected delay
//! - `catalog_latency_injected_ms` (gauge): current injected latency
//!
//! Recording is always on and costs nothing without an installed recorder;
//! the Prometheus endpoint is only served when enabled in configuration.

use axum::http::StatusCode;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(operation: &'static str, status: StatusCode, start: Instant) {
    metrics::counter!(
        "catalog_requests_total",
        "operation" => operation,
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("catalog_request_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

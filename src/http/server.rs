//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with catalog and admin handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener and shut down gracefully
//!
//! # Design Decisions
//! - Body size is capped with `DefaultBodyLimit` so oversized bodies reach the
//!   handler as an extractor error and get the catalog's JSON envelope
//! - No server-side request timeout: injected latency must run to completion
//!   so callers can observe it, and a request's store call is not cancelled
//!   by the service

use axum::{
    extract::{DefaultBodyLimit, Request},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::admin::{admin_routes, LatencyControl};
use crate::catalog::catalog_routes;
use crate::config::{CatalogConfig, ServiceConfig};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::tracing::Tracer;
use crate::store::ProductStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub tracer: Arc<dyn Tracer>,
    pub latency: Arc<LatencyControl>,
    pub service: Arc<ServiceConfig>,
}

/// HTTP server for the catalog.
pub struct HttpServer {
    router: Router,
    config: CatalogConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and collaborators.
    pub fn new(
        config: CatalogConfig,
        store: Arc<dyn ProductStore>,
        tracer: Arc<dyn Tracer>,
    ) -> Self {
        let state = AppState {
            store,
            tracer,
            latency: Arc::new(LatencyControl::new(config.latency.initial_ms)),
            service: Arc::new(config.service.clone()),
        };
        Self::with_state(config, state)
    }

    /// Create a server around pre-built state (e.g. a shared latency cell).
    pub fn with_state(config: CatalogConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &CatalogConfig, state: AppState) -> Router {
        Router::new()
            .merge(catalog_routes())
            .merge(admin_routes())
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = request_id(request.headers()).unwrap_or("unknown"),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service.name,
            version = %self.config.service.version,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

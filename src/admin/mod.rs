//! Debug controls.
//!
//! Only latency injection lives here: a process-wide delay applied to every
//! read-path request so callers can exercise their timeout handling.

pub mod handlers;
pub mod latency;

use axum::{
    routing::{get, put},
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;

pub use latency::{LatencyChange, LatencyControl};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/latency", get(get_latency))
        .route("/latency/{latency}", put(set_latency))
}

//! Product catalog subsystem.
//!
//! # Data Flow
//! ```text
//! request
//!     → handlers.rs (extract trace context, start span)
//!     → admin::latency (injected delay, read paths only)
//!     → store::ProductStore
//!     → http::response envelope, span tagged and closed
//! ```

pub mod handlers;
pub mod id;
pub mod model;

use axum::{routing::get, Router};

use crate::http::server::AppState;
use self::handlers::*;

pub use id::{ParseProductIdError, ProductId};
pub use model::{Liveness, NewProduct, Product};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/liveness", get(get_liveness))
        .route("/products", get(get_products).post(create_product))
        .route("/products/{id}", get(get_product))
}

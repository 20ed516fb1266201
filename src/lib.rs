//! Product catalog HTTP service library.

pub mod admin;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use admin::LatencyControl;
pub use catalog::{Product, ProductId};
pub use config::schema::CatalogConfig;
pub use error::CatalogError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{MemoryStore, ProductStore, StoreError};

//! Product storage.
//!
//! # Data Flow
//! ```text
//! handler
//!     → ProductStore (find_all / find_by_id / insert)
//!     → backing collection (authoritative, never cached by handlers)
//! ```
//!
//! # Design Decisions
//! - Object-safe trait with boxed futures so the store is injected as
//!   `Arc<dyn ProductStore>`
//! - Errors display as the bare backend text; handlers add their own prefix

pub mod memory;

use futures_util::future::BoxFuture;

use crate::catalog::{Product, ProductId};

pub use memory::MemoryStore;

/// Failure reported by the store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No document has the requested id.
    #[error("not found")]
    NotFound,

    /// A document with this id already exists.
    #[error("E11000 duplicate key error index: _id_ dup key: {0}")]
    DuplicateKey(ProductId),

    /// Transport or server failure, carrying the backend's message.
    #[error("{0}")]
    Backend(String),
}

/// The document collection holding products.
pub trait ProductStore: Send + Sync {
    /// Every stored product.
    fn find_all(&self) -> BoxFuture<'_, Result<Vec<Product>, StoreError>>;

    /// The product with the given id.
    fn find_by_id(&self, id: ProductId) -> BoxFuture<'_, Result<Product, StoreError>>;

    /// Persist a new product.
    fn insert(&self, product: Product) -> BoxFuture<'_, Result<(), StoreError>>;
}

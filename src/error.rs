//! Request-level errors and their envelope mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response;
use crate::store::StoreError;

/// Every way a catalog or admin request can fail.
///
/// The `Display` text is the exact `message` returned to the caller. Store
/// failures embed the collaborator's error text verbatim after a fixed prefix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Incorrect Format for ProductID")]
    InvalidProductId,

    #[error("Incorrect Field Name(s)/ Value(s)")]
    InvalidBody,

    #[error("latency paramter not an integer")]
    InvalidLatency,

    /// Listing failed. Surfaced as 404.
    #[error("Products {0}")]
    ProductsUnavailable(#[source] StoreError),

    /// Single lookup failed, including "not found". Surfaced as 404.
    #[error("Product {0}")]
    ProductUnavailable(#[source] StoreError),

    /// Insert failed. Surfaced as 400.
    #[error("Product {0}")]
    ProductNotStored(#[source] StoreError),
}

impl CatalogError {
    pub fn status(&self) -> StatusCode {
        match self {
            CatalogError::InvalidProductId
            | CatalogError::InvalidBody
            | CatalogError::InvalidLatency
            | CatalogError::ProductNotStored(_) => StatusCode::BAD_REQUEST,
            CatalogError::ProductsUnavailable(_) | CatalogError::ProductUnavailable(_) => {
                StatusCode::NOT_FOUND
            }
        }
    }

    /// Text recorded on the tracing span: the bare store error for store
    /// failures, the caller-facing message otherwise.
    pub fn detail(&self) -> String {
        match self {
            CatalogError::ProductsUnavailable(e)
            | CatalogError::ProductUnavailable(e)
            | CatalogError::ProductNotStored(e) => e.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidProductId | CatalogError::InvalidBody | CatalogError::InvalidLatency
        )
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        response::message(self.status(), self.to_string())
    }
}

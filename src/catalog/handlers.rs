//! Catalog request handlers.
//!
//! Each handler is one linear pipeline: validate → call the store → respond.
//! Store-touching handlers run inside an [`OperationSpan`] which is tagged with
//! the returned status and closed when the handler returns.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Instant;

use crate::catalog::{Liveness, NewProduct, ProductId};
use crate::error::CatalogError;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::observability::tracing::OperationSpan;

pub const CREATED_MESSAGE: &str = "Product created successfully!";

/// `GET /liveness`
pub async fn get_liveness(State(state): State<AppState>) -> Response {
    let start = Instant::now();
    let liveness = Liveness {
        version: state.service.version.clone(),
        service_name: state.service.name.clone(),
    };
    let response = response::data(StatusCode::OK, liveness);
    metrics::record_request("get_liveness", response.status(), start);
    response
}

/// `GET /products`
pub async fn get_products(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let mut span = OperationSpan::start(state.tracer.as_ref(), &headers, "db_get_products");

    state.latency.delay().await;

    let response = match state.store.find_all().await {
        Ok(products) => {
            span.succeed(StatusCode::OK);
            response::data(StatusCode::OK, products)
        }
        Err(err) => reject(&mut span, CatalogError::ProductsUnavailable(err)),
    };
    metrics::record_request("get_products", response.status(), start);
    response
}

/// `GET /products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    raw_id: Result<Path<String>, PathRejection>,
) -> Response {
    let start = Instant::now();
    let mut span = OperationSpan::start(state.tracer.as_ref(), &headers, "db_get_product");

    state.latency.delay().await;

    let id = match raw_id {
        Ok(Path(raw_id)) => {
            span.log_fields(&[("event", "string-format"), ("product.id", raw_id.as_str())]);
            raw_id.parse::<ProductId>().ok()
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Product id is not a valid path segment");
            None
        }
    };

    let response = match id {
        None => reject(&mut span, CatalogError::InvalidProductId),
        Some(id) => match state.store.find_by_id(id).await {
            Ok(product) => {
                span.succeed(StatusCode::OK);
                response::data(StatusCode::OK, product)
            }
            Err(err) => reject(&mut span, CatalogError::ProductUnavailable(err)),
        },
    };
    metrics::record_request("get_product", response.status(), start);
    response
}

/// `POST /products`
///
/// The body is read and parsed by hand so every malformed, oversized or
/// truncated body gets the catalog's own 400 envelope.
pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let mut span = OperationSpan::start(state.tracer.as_ref(), &headers, "db_create_product");

    let parsed = match body {
        Ok(body) => serde_json::from_slice::<NewProduct>(&body).map_err(|err| err.to_string()),
        Err(rejection) => Err(rejection.body_text()),
    };

    let response = match parsed {
        Err(err) => {
            tracing::debug!(error = %err, "Create body did not match the product shape");
            reject(&mut span, CatalogError::InvalidBody)
        }
        Ok(new_product) => {
            let product = new_product.into_product(ProductId::new());
            span.log_field("product.id", &product.id.to_string());
            match state.store.insert(product.clone()).await {
                Ok(()) => {
                    tracing::info!(product_id = %product.id, name = %product.name, "Product created");
                    span.succeed(StatusCode::CREATED);
                    response::created(CREATED_MESSAGE, product)
                }
                Err(err) => reject(&mut span, CatalogError::ProductNotStored(err)),
            }
        }
    };
    metrics::record_request("create_product", response.status(), start);
    response
}

/// Record a failure on the span and turn it into the error envelope.
fn reject(span: &mut OperationSpan, err: CatalogError) -> Response {
    let status = err.status();
    if err.is_client_error() {
        tracing::debug!(operation = span.operation(), status = status.as_u16(), error = %err, "Request rejected");
    } else {
        tracing::warn!(operation = span.operation(), status = status.as_u16(), error = %err, "Store call failed");
    }
    span.fail(status, &err.detail());
    err.into_response()
}

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Instant;

use crate::error::CatalogError;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;

/// `PUT /latency/{latency}`: replace the injected read-path delay.
pub async fn set_latency(
    State(state): State<AppState>,
    raw: Result<Path<String>, PathRejection>,
) -> Response {
    let start = Instant::now();
    let change = match &raw {
        Ok(Path(param)) => state.latency.set_from_param(param),
        Err(_) => Err(CatalogError::InvalidLatency),
    };
    let response = match change {
        Ok(change) => {
            tracing::info!(
                old_latency_ms = change.old_ms,
                new_latency_ms = change.new_ms,
                "Injected latency updated"
            );
            response::data(StatusCode::OK, change.to_string())
        }
        Err(err) => {
            match &raw {
                Ok(Path(param)) => tracing::warn!(%param, error = %err, "Rejected latency parameter"),
                Err(rejection) => tracing::warn!(error = %rejection, "Latency parameter is not a valid path segment"),
            }
            err.into_response()
        }
    };
    metrics::record_request("set_latency", response.status(), start);
    response
}

/// `GET /latency`: current injected delay in milliseconds.
pub async fn get_latency(State(state): State<AppState>) -> Response {
    response::data(StatusCode::OK, state.latency.get())
}

//! Response envelopes.
//!
//! # Responsibilities
//! - Wrap every reply in `{status, data}` or `{status, message}`
//! - Keep the HTTP status and the body's `status` field identical
//!
//! # Design Decisions
//! - Typed envelopes instead of ad-hoc `json!` values so payload
//!   serialization stays checked

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub status: u16,
    pub data: T,
}

/// Failure envelope.
#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub status: u16,
    pub message: String,
}

/// Envelope returned after a resource is created.
#[derive(Debug, Serialize)]
pub struct CreatedEnvelope<T> {
    pub status: u16,
    pub message: String,
    #[serde(rename = "resourceId")]
    pub resource_id: T,
}

pub fn data<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = DataEnvelope {
        status: status.as_u16(),
        data,
    };
    (status, Json(body)).into_response()
}

pub fn message(status: StatusCode, message: impl Into<String>) -> Response {
    let body = MessageEnvelope {
        status: status.as_u16(),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

pub fn created<T: Serialize>(message: impl Into<String>, resource: T) -> Response {
    let status = StatusCode::CREATED;
    let body = CreatedEnvelope {
        status: status.as_u16(),
        message: message.into(),
        resource_id: resource,
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_mirrors_body() {
        let res = message(StatusCode::NOT_FOUND, "Products boom");
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(res).await,
            json!({"status": 404, "message": "Products boom"})
        );

        let res = data(StatusCode::OK, vec![1, 2]);
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"status": 200, "data": [1, 2]}));
    }

    #[tokio::test]
    async fn test_created_envelope() {
        let res = created("done", json!({"id": "x"}));
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(res).await,
            json!({"status": 201, "message": "done", "resourceId": {"id": "x"}})
        );
    }
}

//! HTTP handlers: the chat turn flow and session lifecycle endpoints.

mod chat;
mod session;

pub use chat::{chat, OFFLINE_REPLY};
pub use session::{export_session, get_session, import_session, remember, reset_session};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "anima-gateway" }))
}

/// Handler-level error: maps storage/encoding failures to JSON responses.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Store(anima_core::StoreError),
    Memory(anima_core::MemoryError),
}

impl From<anima_core::StoreError> for ApiError {
    fn from(e: anima_core::StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<anima_core::MemoryError> for ApiError {
    fn from(e: anima_core::MemoryError) -> Self {
        ApiError::Memory(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(id) => (StatusCode::NOT_FOUND, format!("unknown session: {id}")),
            ApiError::Store(e) => {
                tracing::error!(target: "anima::gateway", error = %e, "store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "session store failure".to_string())
            }
            ApiError::Memory(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

//! Public API types

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::llm::{CompletionError, ExtractReason};

/// Every successful response is wrapped as `{"status": 200, "data": ...}`.
#[derive(Serialize, Deserialize, Debug)]
pub struct Envelope<T> {
    pub status: u16,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { status: 200, data }
    }
}

// Errors

pub enum ApiError {
    BadRequest(String),
    Unauthorized(&'static str),
    NotFound(String),
    UpstreamEmpty(ExtractReason),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn from_completion(err: CompletionError) -> Self {
        match err {
            CompletionError::NoText(reason) => ApiError::UpstreamEmpty(reason),
            CompletionError::Request(err) => ApiError::Internal(err),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => {
                tracing::debug!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, json!({ "message": message }))
            }
            ApiError::Unauthorized(message) => {
                tracing::debug!("Unauthorized: {}", message);
                (StatusCode::UNAUTHORIZED, json!({ "message": message }))
            }
            ApiError::NotFound(message) => {
                tracing::debug!("Not found: {}", message);
                (StatusCode::NOT_FOUND, json!({ "message": message }))
            }
            ApiError::UpstreamEmpty(reason) => {
                tracing::error!("Completion returned no text: {}", reason);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "message": "Chat error", "reason": reason.as_str() }),
                )
            }
            ApiError::Internal(err) => {
                // Always log the error
                tracing::error!("{}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": format!("Something went wrong: {}", err) }),
                )
            }
        };

        let mut body = body;
        body["status"] = json!(status.as_u16());
        (status, Json(body)).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}

pub mod user {
    pub use crate::api::routes::user::public::*;
}

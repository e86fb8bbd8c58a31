//! Error responses for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Errors returned by HTTP handlers as JSON `{ "error": ... }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or wrong admin key.
    #[error("Unauthorized")]
    Unauthorized,

    /// No route matched.
    #[error("Not found")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

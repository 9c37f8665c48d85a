//! HTTP-facing error types. `ExtractError` from `radix-core` is mapped to a
//! response here; anything unrecoverable propagates as `anyhow::Error` at the
//! binary's top level instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use radix_core::ExtractError;
use serde_json::json;

pub struct ApiError(pub ExtractError);

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ExtractError::NotFound(_) => StatusCode::NOT_FOUND,
            ExtractError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            ExtractError::Empty => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

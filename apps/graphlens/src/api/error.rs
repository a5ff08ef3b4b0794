//! # API Errors
//!
//! Maps engine errors onto HTTP responses. Store failures are opaque to the
//! client; their detail is logged server-side only.

use super::types::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use graphlens_core::GraphLensError;

/// Body of every 500 response.
pub const INTERNAL_ERROR_DETAIL: &str = "An internal server error occurred.";

/// An error response: status plus client-facing detail.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    /// Opaque 500. `cause` is logged, never returned.
    #[must_use]
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_DETAIL)
    }
}

impl From<GraphLensError> for ApiError {
    fn from(e: GraphLensError) -> Self {
        match e {
            GraphLensError::NotFound(detail) => Self::bad_request(detail),
            GraphLensError::Forbidden(detail) => Self::new(StatusCode::FORBIDDEN, detail),
            other => Self::internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

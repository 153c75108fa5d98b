//! Error types for the posesión efectiva server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use posesion_core::RenderError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Template unavailable: {0}")]
    TemplateUnavailable(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Draft not found: {0}")]
    DraftNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::TemplateUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "TEMPLATE_UNAVAILABLE")
            }
            ServerError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_FAILED"),
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::DraftNotFound(_) => (StatusCode::NOT_FOUND, "DRAFT_NOT_FOUND"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

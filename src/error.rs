//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` for all error conditions and implements Axum's
//! `IntoResponse` so handlers can return `Result<T>` directly. Every error
//! response is logged with its cause chain before it is sent.
//!
//! Error mappings:
//! - `InvalidBody`, `Blame(InvalidQuery)` → 400
//! - `Blame(NotFound)` → 404
//! - `Blame(LookupFailed | MalformedData)` → 502
//! - `Blame(Cancelled)` → 503
//! - `Store` → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::blame::BlameError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Blame(#[from] BlameError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Blame(BlameError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
            AppError::Blame(BlameError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Blame(BlameError::Cancelled { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Blame(e) if e.is_lookup_failure() => StatusCode::BAD_GATEWAY,
            AppError::Blame(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = ?self, status = status.as_u16(), "{}", error_message);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", error_message);
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

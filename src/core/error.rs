use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("I/O failure: {0}")]
    IoFailure(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error kind included in every error body
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::UploadFailed(_) => "UPLOAD_FAILED",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::IoFailure(_) => "IO_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UploadFailed(_)
            | AppError::StoreUnavailable(_)
            | AppError::IoFailure(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, errors) = match self {
            AppError::Validation(msg) => (msg.clone(), Some(vec![msg])),
            AppError::UploadFailed(ref msg) => {
                tracing::error!("Upload failed: {}", msg);
                ("Upload failed".to_string(), None)
            }
            AppError::StoreUnavailable(ref msg) => {
                tracing::error!("Metadata store unavailable: {}", msg);
                ("Metadata store unavailable".to_string(), None)
            }
            AppError::IoFailure(ref msg) => {
                tracing::error!("Blob store I/O failure: {}", msg);
                ("Storage I/O failure".to_string(), None)
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::PayloadTooLarge(msg) => (msg, None),
        };

        let body = Json(ErrorResponse::new(code, message, errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

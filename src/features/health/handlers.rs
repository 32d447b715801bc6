use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::features::files::FileService;
use crate::shared::types::ErrorResponse;

/// Health check
///
/// Succeeds when the metadata database answers a trivial query.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 503, description = "Metadata store unreachable", body = ErrorResponse)
    )
)]
pub async fn health_check(State(service): State<Arc<FileService>>) -> Response {
    match service.health().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            let body = ErrorResponse::new(e.code(), "Metadata store unavailable".to_string(), None);
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

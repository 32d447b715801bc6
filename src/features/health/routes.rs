use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::files::FileService;
use crate::features::health::handlers;

/// Liveness/readiness probe
pub fn routes(file_service: Arc<FileService>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(file_service)
}

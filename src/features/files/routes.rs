use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, download_file, get_file_metadata, list_files, upload_file,
};
use crate::features::files::services::FileService;
use crate::shared::constants::MULTIPART_OVERHEAD;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>, max_upload_size: usize) -> Router {
    Router::new()
        .route(
            "/files",
            post(upload_file)
                .layer(DefaultBodyLimit::max(max_upload_size + MULTIPART_OVERHEAD))
                .get(list_files),
        )
        .route("/files/{id}", get(download_file).delete(delete_file))
        .route("/files/{id}/metadata", get(get_file_metadata))
        .with_state(file_service)
}

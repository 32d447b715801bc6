use utoipa::{Modify, OpenApi};

use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::features::health::handlers as health_handlers;
use crate::shared::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::download_file,
        files_handlers::get_file_metadata,
        files_handlers::delete_file,
        // Health
        health_handlers::health_check,
    ),
    components(
        schemas(
            // Shared
            ErrorResponse,
            // Files
            files_dtos::UploadFileDto,
            files_dtos::UploadResponseDto,
            files_dtos::FileSummaryDto,
            files_dtos::FileMetadataDto,
            files_dtos::DeleteFileResponseDto,
        )
    ),
    tags(
        (name = "files", description = "File upload, download, listing and deletion"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "File Server API",
        version = "0.1.0",
        description = "Upload, list, download and delete stored files",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

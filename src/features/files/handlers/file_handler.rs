use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppPath, AppQuery};
use crate::features::files::dtos::{
    DeleteFileResponseDto, FileMetadataDto, FileSummaryDto, UploadFileDto, UploadResponseDto,
};
use crate::features::files::services::FileService;
use crate::shared::constants::UNNAMED_FILE;
use crate::shared::types::{ErrorResponse, PaginationQuery};

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
    }
}

/// Build a `Content-Disposition` value with an ASCII fallback and an RFC 5987
/// encoded name
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

/// Upload a file
///
/// Accepts multipart/form-data with a single `file` field. Other fields are
/// ignored.
#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    request_body(content = UploadFileDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadResponseDto),
        (status = 400, description = "Missing file field or malformed multipart body", body = ErrorResponse),
        (status = 413, description = "File exceeds the upload size limit", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponseDto>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let file_name = field
            .file_name()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNNAMED_FILE)
            .to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        upload = Some((file_name, content_type, data));
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    let record = service
        .upload_file(&file_name, content_type.as_deref(), data)
        .await?;

    Ok(Json(record.into()))
}

/// Download a file
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File identifier")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(service): State<Arc<FileService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Response> {
    let download = service.download_file(id).await?;

    let body = Body::from_stream(ReaderStream::new(download.blob.reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.mimetype)
        .header(header::CONTENT_LENGTH, download.blob.size)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&download.original_filename),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

/// List stored files, newest first
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Stored files", body = Vec<FileSummaryDto>),
        (status = 400, description = "Invalid pagination parameters", body = ErrorResponse),
        (status = 500, description = "Metadata store failure", body = ErrorResponse)
    )
)]
pub async fn list_files(
    State(service): State<Arc<FileService>>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<Vec<FileSummaryDto>>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let files = service.list_files(&query).await?;
    Ok(Json(files.into_iter().map(Into::into).collect()))
}

/// Get file metadata without touching the stored contents
///
/// Unknown ids are answered with `found: false` rather than 404.
#[utoipa::path(
    get,
    path = "/files/{id}/metadata",
    tag = "files",
    params(("id" = Uuid, Path, description = "File identifier")),
    responses(
        (status = 200, description = "Metadata lookup result", body = FileMetadataDto),
        (status = 400, description = "Malformed id", body = ErrorResponse)
    )
)]
pub async fn get_file_metadata(
    State(service): State<Arc<FileService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<FileMetadataDto>> {
    let record = service.get_metadata(id).await?;
    Ok(Json(FileMetadataDto::from_lookup(id, record)))
}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File identifier")),
    responses(
        (status = 200, description = "File deleted", body = DeleteFileResponseDto),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    State(service): State<Arc<FileService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DeleteFileResponseDto>> {
    service.delete_file(id).await?;
    Ok(Json(DeleteFileResponseDto { deleted: id }))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::files::models::FileRecord;
use crate::shared::constants::DEFAULT_MIME_TYPE;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Response DTO for a completed upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponseDto {
    pub id: Uuid,
    /// Original filename as uploaded
    #[schema(example = "report.pdf")]
    pub filename: String,
    /// Size of the file in bytes
    pub size: i64,
    #[schema(example = "application/pdf")]
    pub mimetype: String,
    /// Physical name of the stored blob
    pub path: String,
}

impl From<FileRecord> for UploadResponseDto {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.original_filename,
            size: record.size,
            mimetype: record.mimetype,
            path: record.physical_name,
        }
    }
}

/// One entry of the file listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileSummaryDto {
    pub id: Uuid,
    pub filename: String,
    pub size: i64,
    pub mimetype: String,
    /// Upload time, ISO-8601
    pub upload_date: DateTime<Utc>,
}

impl From<FileRecord> for FileSummaryDto {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.original_filename,
            size: record.size,
            mimetype: record.mimetype,
            upload_date: record.upload_timestamp,
        }
    }
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    /// Identifier of the deleted file
    pub deleted: Uuid,
}

/// Metadata lookup result. Unknown ids are reported with `found: false`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileMetadataDto {
    pub id: Uuid,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileMetadataDto {
    pub fn from_lookup(id: Uuid, record: Option<FileRecord>) -> Self {
        match record {
            Some(record) => Self {
                id,
                found: true,
                name: Some(record.original_filename),
                size: Some(record.size),
                mime_type: Some(record.mimetype),
            },
            None => Self {
                id,
                found: false,
                name: None,
                size: None,
                mime_type: None,
            },
        }
    }
}

/// Pick the MIME type for an upload: the client's hint when non-empty,
/// otherwise a guess from the filename extension, otherwise
/// `application/octet-stream`.
pub fn resolve_mime_type(content_type_hint: Option<&str>, filename: &str) -> String {
    if let Some(hint) = content_type_hint.map(str::trim).filter(|h| !h.is_empty()) {
        return hint.to_string();
    }

    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string()
}

//! File service
//!
//! Coordinates the metadata store and the blob store. The two are not updated
//! atomically:
//!
//! - upload writes the blob first and removes it again if the row insert fails
//! - delete removes the row first, so a crash in between leaves an orphan blob
//!   rather than a record pointing at nothing
//!
//! Inconsistencies that do occur are logged with an `inconsistency` field and
//! never repaired here.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::resolve_mime_type;
use crate::features::files::models::{
    parse_physical_name, FileDownload, FileRecord, NewFileRecord,
};
use crate::features::files::repositories::{FileRepository, MetadataError};
use crate::modules::storage::{BlobError, BlobStore};
use crate::shared::types::PaginationQuery;

/// Service for file operations
pub struct FileService {
    repository: Arc<dyn FileRepository>,
    blob_store: Arc<dyn BlobStore>,
}

fn store_error(e: MetadataError) -> AppError {
    match e {
        MetadataError::Unavailable(msg) => AppError::StoreUnavailable(msg),
        MetadataError::DuplicateIdentifier(id) => {
            AppError::Internal(format!("Duplicate file id {}", id))
        }
    }
}

fn file_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("File {} not found", id))
}

impl FileService {
    pub fn new(repository: Arc<dyn FileRepository>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self {
            repository,
            blob_store,
        }
    }

    /// Store a new file: blob first, then its metadata row
    ///
    /// # Arguments
    /// * `original_filename` - The client-supplied filename, stored verbatim
    /// * `content_type_hint` - The client-supplied MIME type, if any
    /// * `data` - The file content
    ///
    /// # Returns
    /// The stored record. On failure no record exists and the blob has been
    /// removed (best effort).
    pub async fn upload_file(
        &self,
        original_filename: &str,
        content_type_hint: Option<&str>,
        data: Bytes,
    ) -> Result<FileRecord> {
        let id = Uuid::new_v4();
        let mimetype = resolve_mime_type(content_type_hint, original_filename);
        let new_record = NewFileRecord::new(id, original_filename, data.len() as i64, mimetype);
        let physical_name = new_record.physical_name.clone();

        let written = self
            .blob_store
            .write(&physical_name, data)
            .await
            .map_err(|e| {
                error!("Failed to write blob '{}': {}", physical_name, e);
                AppError::UploadFailed(format!("Could not store file contents: {}", e))
            })?;

        debug!("Blob written: key={}, bytes={}", physical_name, written);

        let record = match self.repository.insert(new_record).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to save file metadata for id={}: {}", id, e);
                self.discard_blob(&physical_name).await;
                return Err(AppError::UploadFailed(format!(
                    "Could not save file metadata: {}",
                    e
                )));
            }
        };

        info!(
            "File uploaded: id={}, key={}, size={}, mimetype={}",
            record.id, record.physical_name, record.size, record.mimetype
        );

        Ok(record)
    }

    /// Compensation for a failed upload. Failures are logged only.
    async fn discard_blob(&self, physical_name: &str) {
        match self.blob_store.delete(physical_name).await {
            Ok(_) => warn!("Removed blob '{}' after failed upload", physical_name),
            Err(e) => warn!(
                inconsistency = "orphan_blob",
                "Failed to remove blob '{}' after failed upload: {}", physical_name, e
            ),
        }
    }

    /// Open a stored file for download
    pub async fn download_file(&self, id: Uuid) -> Result<FileDownload> {
        let record = self
            .repository
            .get_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| file_not_found(id))?;

        if parse_physical_name(&record.physical_name).map(|(owner, _)| owner) != Some(id) {
            warn!(
                inconsistency = "foreign_physical_name",
                "File {} points at blob '{}' derived from another id", id, record.physical_name
            );
        }

        let blob = match self.blob_store.read(&record.physical_name).await {
            Ok(blob) => blob,
            Err(BlobError::NotFound(_)) => {
                warn!(
                    inconsistency = "dangling_record",
                    "File {} has metadata but blob '{}' is missing", id, record.physical_name
                );
                return Err(file_not_found(id));
            }
            Err(e) => {
                return Err(AppError::IoFailure(format!(
                    "Could not read file {}: {}",
                    id, e
                )))
            }
        };

        if blob.size != record.size as u64 {
            warn!(
                inconsistency = "size_mismatch",
                "File {} recorded size {} but blob '{}' holds {} bytes",
                id,
                record.size,
                record.physical_name,
                blob.size
            );
        }

        Ok(FileDownload {
            original_filename: record.original_filename,
            mimetype: record.mimetype,
            blob,
        })
    }

    /// List file records, newest first. The blob store is not consulted.
    pub async fn list_files(&self, page: &PaginationQuery) -> Result<Vec<FileRecord>> {
        self.repository.list_all(page).await.map_err(store_error)
    }

    /// Look up metadata only; `None` for an unknown id
    pub async fn get_metadata(&self, id: Uuid) -> Result<Option<FileRecord>> {
        self.repository.get_by_id(id).await.map_err(store_error)
    }

    /// Delete a file: metadata row first, then the blob
    pub async fn delete_file(&self, id: Uuid) -> Result<()> {
        let record = self
            .repository
            .get_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| file_not_found(id))?;

        // A concurrent delete may have removed the row since the lookup
        if !self.repository.delete_by_id(id).await.map_err(store_error)? {
            debug!("File {} was already removed by another request", id);
            return Err(file_not_found(id));
        }

        match self.blob_store.delete(&record.physical_name).await {
            Ok(true) => debug!("Blob deleted: key={}", record.physical_name),
            Ok(false) => warn!(
                inconsistency = "dangling_record",
                "Blob '{}' for file {} was already missing", record.physical_name, id
            ),
            Err(e) => warn!(
                inconsistency = "orphan_blob",
                "Metadata for file {} removed but blob '{}' could not be deleted: {}",
                id,
                record.physical_name,
                e
            ),
        }

        info!("File deleted: id={}, key={}", id, record.physical_name);
        Ok(())
    }

    /// Check that the metadata store is reachable
    pub async fn health(&self) -> Result<()> {
        self.repository.ping().await.map_err(store_error)
    }

    pub fn storage_type(&self) -> &'static str {
        self.blob_store.storage_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::{BlobReader, LocalBlobStore};
    use crate::shared::test_helpers::InMemoryFileRepository;
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    struct Fixture {
        _temp: TempDir,
        blobs: Arc<LocalBlobStore>,
        repository: Arc<InMemoryFileRepository>,
        service: FileService,
    }

    async fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let blobs = Arc::new(LocalBlobStore::new(temp.path()).await.unwrap());
        let repository = Arc::new(InMemoryFileRepository::new());
        let service = FileService::new(repository.clone(), blobs.clone());
        Fixture {
            _temp: temp,
            blobs,
            repository,
            service,
        }
    }

    async fn read_all(download: FileDownload) -> Vec<u8> {
        let mut reader = download.blob.reader;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).await.unwrap();
        contents
    }

    /// Blob store whose writes always fail
    struct BrokenBlobStore;

    #[async_trait]
    impl BlobStore for BrokenBlobStore {
        async fn write(&self, key: &str, _data: Bytes) -> std::result::Result<u64, BlobError> {
            Err(BlobError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"),
            ))
        }

        async fn read(&self, key: &str) -> std::result::Result<BlobReader, BlobError> {
            Err(BlobError::NotFound(key.to_string()))
        }

        async fn exists(&self, _key: &str) -> std::result::Result<bool, BlobError> {
            Ok(false)
        }

        async fn delete(&self, _key: &str) -> std::result::Result<bool, BlobError> {
            Ok(false)
        }

        fn storage_type(&self) -> &'static str {
            "broken"
        }
    }

    /// Blob store that accepts writes but cannot delete
    struct UndeletableBlobStore(LocalBlobStore);

    #[async_trait]
    impl BlobStore for UndeletableBlobStore {
        async fn write(&self, key: &str, data: Bytes) -> std::result::Result<u64, BlobError> {
            self.0.write(key, data).await
        }

        async fn read(&self, key: &str) -> std::result::Result<BlobReader, BlobError> {
            self.0.read(key).await
        }

        async fn exists(&self, key: &str) -> std::result::Result<bool, BlobError> {
            self.0.exists(key).await
        }

        async fn delete(&self, key: &str) -> std::result::Result<bool, BlobError> {
            Err(BlobError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume"),
            ))
        }

        fn storage_type(&self) -> &'static str {
            "undeletable"
        }
    }

    /// Repository where another request removes the row between lookup and delete
    struct RacingFileRepository(InMemoryFileRepository);

    #[async_trait]
    impl FileRepository for RacingFileRepository {
        async fn insert(
            &self,
            record: NewFileRecord,
        ) -> std::result::Result<FileRecord, MetadataError> {
            self.0.insert(record).await
        }

        async fn get_by_id(
            &self,
            id: Uuid,
        ) -> std::result::Result<Option<FileRecord>, MetadataError> {
            self.0.get_by_id(id).await
        }

        async fn list_all(
            &self,
            page: &PaginationQuery,
        ) -> std::result::Result<Vec<FileRecord>, MetadataError> {
            self.0.list_all(page).await
        }

        async fn delete_by_id(&self, id: Uuid) -> std::result::Result<bool, MetadataError> {
            // The other request wins the row
            self.0.delete_by_id(id).await?;
            Ok(false)
        }

        async fn ping(&self) -> std::result::Result<(), MetadataError> {
            self.0.ping().await
        }
    }

    #[tokio::test]
    async fn test_upload_then_download_returns_same_bytes() {
        let f = fixture().await;
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        let record = f
            .service
            .upload_file("data.bin", None, Bytes::from(payload.clone()))
            .await
            .unwrap();
        assert_eq!(record.size, payload.len() as i64);
        assert_eq!(record.original_filename, "data.bin");

        let download = f.service.download_file(record.id).await.unwrap();
        assert_eq!(download.blob.size, payload.len() as u64);
        assert_eq!(read_all(download).await, payload);
    }

    #[tokio::test]
    async fn test_upload_empty_file() {
        let f = fixture().await;

        let record = f
            .service
            .upload_file("empty.txt", None, Bytes::new())
            .await
            .unwrap();
        assert_eq!(record.size, 0);
        assert_eq!(record.mimetype, "text/plain");

        let download = f.service.download_file(record.id).await.unwrap();
        assert!(read_all(download).await.is_empty());
    }

    #[tokio::test]
    async fn test_report_pdf_lifecycle() {
        let f = fixture().await;

        let record = f
            .service
            .upload_file("report.pdf", Some("application/pdf"), Bytes::from(vec![7u8; 100]))
            .await
            .unwrap();
        assert_eq!(record.original_filename, "report.pdf");
        assert_eq!(record.size, 100);
        assert_eq!(record.mimetype, "application/pdf");

        let download = f.service.download_file(record.id).await.unwrap();
        assert_eq!(download.mimetype, "application/pdf");
        assert_eq!(download.original_filename, "report.pdf");
        assert_eq!(read_all(download).await.len(), 100);

        f.service.delete_file(record.id).await.unwrap();

        let err = f.service.download_file(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!f.blobs.exists(&record.physical_name).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_filename_uploads_are_isolated() {
        let f = fixture().await;

        let first = f
            .service
            .upload_file("photo.jpg", None, Bytes::from_static(b"first"))
            .await
            .unwrap();
        let second = f
            .service
            .upload_file("photo.jpg", None, Bytes::from_static(b"second"))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.physical_name, second.physical_name);
        assert_eq!(first.mimetype, "image/jpeg");

        let a = f.service.download_file(first.id).await.unwrap();
        assert_eq!(read_all(a).await, b"first");
        let b = f.service.download_file(second.id).await.unwrap();
        assert_eq!(read_all(b).await, b"second");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let f = fixture().await;

        let mut ids = Vec::new();
        for name in ["one.txt", "two.txt", "three.txt"] {
            let record = f
                .service
                .upload_file(name, None, Bytes::from_static(b"x"))
                .await
                .unwrap();
            ids.push(record.id);
        }

        let listed: Vec<Uuid> = f
            .service
            .list_files(&PaginationQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_list_paginated() {
        let f = fixture().await;
        for i in 0..5 {
            f.service
                .upload_file(&format!("file{}.txt", i), None, Bytes::from_static(b"x"))
                .await
                .unwrap();
        }

        let page = PaginationQuery {
            limit: Some(2),
            offset: Some(1),
        };
        let listed = f.service.list_files(&page).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].original_filename, "file3.txt");
        assert_eq!(listed[1].original_filename, "file2.txt");
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() {
        let f = fixture().await;

        let keep = f
            .service
            .upload_file("keep.txt", None, Bytes::from_static(b"keep"))
            .await
            .unwrap();
        let gone = f
            .service
            .upload_file("gone.txt", None, Bytes::from_static(b"gone"))
            .await
            .unwrap();

        f.service.delete_file(gone.id).await.unwrap();
        let err = f.service.delete_file(gone.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let download = f.service.download_file(keep.id).await.unwrap();
        assert_eq!(read_all(download).await, b"keep");
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_blob_already_missing() {
        let f = fixture().await;

        let record = f
            .service
            .upload_file("a.txt", None, Bytes::from_static(b"a"))
            .await
            .unwrap();
        f.blobs.delete(&record.physical_name).await.unwrap();

        f.service.delete_file(record.id).await.unwrap();
        assert!(f.repository.get_by_id(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_insert_removes_blob() {
        let f = fixture().await;
        f.repository.fail_inserts(true);

        let err = f
            .service
            .upload_file("doomed.txt", None, Bytes::from_static(b"payload"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));

        // No orphan blob and no record
        let leftovers = std::fs::read_dir(f.blobs.root()).unwrap().count();
        assert_eq!(leftovers, 0);
        assert!(f.repository.is_empty());
    }

    #[tokio::test]
    async fn test_failed_cleanup_still_reports_upload_failed() {
        let temp = TempDir::new().unwrap();
        let blobs = UndeletableBlobStore(LocalBlobStore::new(temp.path()).await.unwrap());
        let repository = Arc::new(InMemoryFileRepository::new());
        repository.fail_inserts(true);
        let service = FileService::new(repository.clone(), Arc::new(blobs));

        let err = service
            .upload_file("stuck.txt", None, Bytes::from_static(b"payload"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
        assert!(repository.is_empty());

        // The blob is left behind as an orphan
        let leftovers = std::fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_delete_losing_race_reports_not_found_and_keeps_blob() {
        let temp = TempDir::new().unwrap();
        let blobs = Arc::new(LocalBlobStore::new(temp.path()).await.unwrap());
        let repository = Arc::new(RacingFileRepository(InMemoryFileRepository::new()));
        let service = FileService::new(repository.clone(), blobs.clone());

        let record = service
            .upload_file("contested.txt", None, Bytes::from_static(b"contested"))
            .await
            .unwrap();

        let err = service.delete_file(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Removing the blob is left to the request that deleted the row
        assert!(blobs.exists(&record.physical_name).await.unwrap());
        assert!(repository.get_by_id(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_blob_write_creates_no_record() {
        let repository = Arc::new(InMemoryFileRepository::new());
        let service = FileService::new(repository.clone(), Arc::new(BrokenBlobStore));

        let err = service
            .upload_file("a.txt", None, Bytes::from_static(b"a"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
        assert!(repository.is_empty());
    }

    #[tokio::test]
    async fn test_missing_blob_yields_not_found() {
        let f = fixture().await;

        let record = f
            .service
            .upload_file("a.txt", None, Bytes::from_static(b"a"))
            .await
            .unwrap();
        std::fs::remove_file(f.blobs.root().join(&record.physical_name)).unwrap();

        let err = f.service.download_file(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let f = fixture().await;
        let id = Uuid::new_v4();

        assert!(matches!(
            f.service.download_file(id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            f.service.delete_file(id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(f.service.get_metadata(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_unavailable_is_translated() {
        let f = fixture().await;
        f.repository.set_unavailable(true);

        let err = f
            .service
            .list_files(&PaginationQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));

        let err = f.service.download_file(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));

        assert!(f.service.health().await.is_err());
    }
}

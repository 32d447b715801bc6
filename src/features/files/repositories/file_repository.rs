use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::features::files::models::{FileRecord, NewFileRecord};
use crate::shared::types::PaginationQuery;

/// Failures reported by the metadata store
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("file id {0} already exists")]
    DuplicateIdentifier(Uuid),

    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
}

/// Row store for file metadata
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert one record, returning it with the store-assigned timestamp
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, MetadataError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, MetadataError>;

    /// Records ordered newest first, ties broken by id
    async fn list_all(&self, page: &PaginationQuery) -> Result<Vec<FileRecord>, MetadataError>;

    /// Returns `false` when no record matched
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, MetadataError>;

    /// Connectivity check
    async fn ping(&self) -> Result<(), MetadataError>;
}

/// PostgreSQL-backed metadata store
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(e: sqlx::Error) -> MetadataError {
    MetadataError::Unavailable(e.to_string())
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, MetadataError> {
        let result = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (id, original_filename, physical_name, size, mimetype)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, original_filename, physical_name, size, mimetype, upload_timestamp
            "#,
        )
        .bind(record.id)
        .bind(&record.original_filename)
        .bind(&record.physical_name)
        .bind(record.size)
        .bind(&record.mimetype)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(file) => {
                debug!("Inserted file record: id={}", file.id);
                Ok(file)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(MetadataError::DuplicateIdentifier(record.id))
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, MetadataError> {
        sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, original_filename, physical_name, size, mimetype, upload_timestamp
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn list_all(&self, page: &PaginationQuery) -> Result<Vec<FileRecord>, MetadataError> {
        // LIMIT NULL means no limit in PostgreSQL
        sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, original_filename, physical_name, size, mimetype, upload_timestamp
            FROM files
            ORDER BY upload_timestamp DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, MetadataError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), MetadataError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(unavailable)
    }
}

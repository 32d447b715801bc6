use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Failures reported by a blob store
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob '{0}' not found")]
    NotFound(String),

    #[error("invalid blob key '{0}'")]
    InvalidKey(String),

    #[error("I/O failure on blob '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl BlobError {
    pub fn io(key: &str, source: std::io::Error) -> Self {
        BlobError::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Readable handle on a stored blob
pub struct BlobReader {
    /// Size of the blob in bytes at the time it was opened
    pub size: u64,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Binary object store keyed by physical name
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create or overwrite the blob, returning the number of bytes written
    async fn write(&self, key: &str, data: Bytes) -> Result<u64, BlobError>;

    /// Open the blob for streaming
    async fn read(&self, key: &str) -> Result<BlobReader, BlobError>;

    #[allow(dead_code)]
    async fn exists(&self, key: &str) -> Result<bool, BlobError>;

    /// Remove the blob. Returns `false` when there was nothing to delete.
    async fn delete(&self, key: &str) -> Result<bool, BlobError>;

    fn storage_type(&self) -> &'static str;
}

/// Reject keys that could address anything outside the store's flat directory
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);

    if invalid {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}

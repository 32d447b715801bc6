//! Filesystem blob store
//!
//! Every blob is a regular file directly under the configured data directory.
//! Keys are validated before being joined onto the root, so the store never
//! touches paths outside it.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::blob_store::{validate_key, BlobError, BlobReader, BlobStore};

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| BlobError::io(&root.display().to_string(), e))?;

        debug!("Local blob store ready at {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    async fn write_all(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn write(&self, key: &str, data: Bytes) -> Result<u64, BlobError> {
        let path = self.path_for(key)?;

        if let Err(e) = Self::write_all(&path, &data).await {
            // Leave no truncated blob behind
            if let Err(cleanup) = fs::remove_file(&path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove partial blob {:?}: {}", path, cleanup);
                }
            }
            return Err(BlobError::io(key, e));
        }

        debug!("Wrote {} bytes to {:?}", data.len(), path);
        Ok(data.len() as u64)
    }

    async fn read(&self, key: &str) -> Result<BlobReader, BlobError> {
        let path = self.path_for(key)?;

        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BlobError::NotFound(key.to_string())
            } else {
                BlobError::io(key, e)
            }
        })?;
        let metadata = file.metadata().await.map_err(|e| BlobError::io(key, e))?;
        if !metadata.is_file() {
            return Err(BlobError::NotFound(key.to_string()));
        }

        Ok(BlobReader {
            size: metadata.len(),
            reader: Box::new(file),
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.path_for(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| BlobError::io(key, e))
    }

    async fn delete(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted blob {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobError::io(key, e)),
        }
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }
}

//! Storage module for file payloads
//!
//! Defines the `BlobStore` contract used by the file service and a
//! filesystem-backed implementation rooted at a single data directory.

mod blob_store;
mod local_blob_store;

pub use blob_store::{BlobError, BlobReader, BlobStore};
#[cfg(test)]
pub use blob_store::validate_key;
pub use local_blob_store::LocalBlobStore;

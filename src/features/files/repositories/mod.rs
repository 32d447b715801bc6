//! Metadata persistence for files
//!
//! Kept behind the `FileRepository` trait so service and handler tests can run
//! against an in-memory store instead of PostgreSQL.

mod file_repository;

pub use file_repository::{FileRepository, MetadataError, PgFileRepository};

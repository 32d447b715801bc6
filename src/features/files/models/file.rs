use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::modules::storage::BlobReader;
use crate::shared::constants::MAX_PHYSICAL_SUFFIX_LEN;

/// Database model for a stored file
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub original_filename: String,
    pub physical_name: String,
    pub size: i64,
    pub mimetype: String,
    pub upload_timestamp: DateTime<Utc>,
}

/// Row to insert; the store assigns `upload_timestamp`
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub id: Uuid,
    pub original_filename: String,
    pub physical_name: String,
    pub size: i64,
    pub mimetype: String,
}

impl NewFileRecord {
    pub fn new(id: Uuid, original_filename: &str, size: i64, mimetype: String) -> Self {
        Self {
            id,
            original_filename: original_filename.to_string(),
            physical_name: physical_name_for(id, original_filename),
            size,
            mimetype,
        }
    }
}

/// An opened blob plus what the caller needs for response headers
#[derive(Debug)]
pub struct FileDownload {
    pub original_filename: String,
    pub mimetype: String,
    pub blob: BlobReader,
}

/// Derive the on-disk key for a record: `{id}_{sanitized filename}`.
///
/// The sanitized suffix only keeps `[A-Za-z0-9._-]`, so the key is always a
/// single flat path component. The id prefix makes keys unique per record.
pub fn physical_name_for(id: Uuid, original_filename: &str) -> String {
    let mut suffix: String = original_filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // ASCII only at this point, so byte truncation is char-safe
    suffix.truncate(MAX_PHYSICAL_SUFFIX_LEN);

    if suffix.is_empty() {
        suffix.push_str("file");
    }

    format!("{}_{}", id, suffix)
}

/// Recover the id and sanitized filename from a physical name
pub fn parse_physical_name(physical_name: &str) -> Option<(Uuid, &str)> {
    let (id, suffix) = physical_name.split_once('_')?;
    let id = Uuid::parse_str(id).ok()?;
    Some((id, suffix))
}

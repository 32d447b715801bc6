#[cfg(test)]
pub use in_memory::InMemoryFileRepository;

#[cfg(test)]
mod in_memory {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    use crate::features::files::models::{FileRecord, NewFileRecord};
    use crate::features::files::repositories::{FileRepository, MetadataError};
    use crate::shared::types::PaginationQuery;

    /// Metadata store kept in memory, with switches for injecting failures.
    ///
    /// Timestamps are strictly increasing so listing order is deterministic.
    #[derive(Default)]
    pub struct InMemoryFileRepository {
        records: Mutex<Vec<FileRecord>>,
        last_timestamp: Mutex<Option<DateTime<Utc>>>,
        fail_inserts: AtomicBool,
        unavailable: AtomicBool,
    }

    impl InMemoryFileRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every insert fail as if the database rejected it
        pub fn fail_inserts(&self, fail: bool) {
            self.fail_inserts.store(fail, Ordering::SeqCst);
        }

        /// Make every call fail as if the database were unreachable
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub fn is_empty(&self) -> bool {
            self.records.lock().unwrap().is_empty()
        }

        fn check_available(&self) -> Result<(), MetadataError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(MetadataError::Unavailable("connection refused".to_string()));
            }
            Ok(())
        }

        fn next_timestamp(&self) -> DateTime<Utc> {
            let mut last = self.last_timestamp.lock().unwrap();
            let now = Utc::now();
            let ts = match *last {
                Some(prev) if now <= prev => prev + Duration::microseconds(1),
                _ => now,
            };
            *last = Some(ts);
            ts
        }
    }

    #[async_trait]
    impl FileRepository for InMemoryFileRepository {
        async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, MetadataError> {
            self.check_available()?;
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(MetadataError::Unavailable("insert rejected".to_string()));
            }

            let upload_timestamp = self.next_timestamp();
            let mut records = self.records.lock().unwrap();
            if records.iter().any(|r| r.id == record.id) {
                return Err(MetadataError::DuplicateIdentifier(record.id));
            }

            let stored = FileRecord {
                id: record.id,
                original_filename: record.original_filename,
                physical_name: record.physical_name,
                size: record.size,
                mimetype: record.mimetype,
                upload_timestamp,
            };
            records.push(stored.clone());
            Ok(stored)
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, MetadataError> {
            self.check_available()?;
            let records = self.records.lock().unwrap();
            Ok(records.iter().find(|r| r.id == id).cloned())
        }

        async fn list_all(
            &self,
            page: &PaginationQuery,
        ) -> Result<Vec<FileRecord>, MetadataError> {
            self.check_available()?;
            let mut records = self.records.lock().unwrap().clone();
            records.sort_by(|a, b| {
                b.upload_timestamp
                    .cmp(&a.upload_timestamp)
                    .then_with(|| b.id.cmp(&a.id))
            });

            let offset = page.offset() as usize;
            let limit = page.limit().map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(records.into_iter().skip(offset).take(limit).collect())
        }

        async fn delete_by_id(&self, id: Uuid) -> Result<bool, MetadataError> {
            self.check_available()?;
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.id != id);
            Ok(records.len() < before)
        }

        async fn ping(&self) -> Result<(), MetadataError> {
            self.check_available()
        }
    }
}

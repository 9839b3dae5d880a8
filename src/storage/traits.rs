//! Storage traits and error types
//!
//! The harvester and prober only see these two narrow contracts; `SqliteStorage`
//! implements both.

use crate::search::SearchCursor;
use crate::storage::{HarvestedRecord, UrlRecord};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    RecordNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Deduplicated record store shared with downstream stages
pub trait RecordSink {
    /// Inserts a record unless its external id is already stored
    ///
    /// # Returns
    ///
    /// `true` if a new row was written, `false` if the id already existed
    fn insert_if_absent(&mut self, record: &HarvestedRecord) -> StorageResult<bool>;

    /// Inserts a page of records, committing them together
    ///
    /// # Returns
    ///
    /// Number of newly written rows
    fn insert_batch_if_absent(&mut self, records: &[HarvestedRecord]) -> StorageResult<usize> {
        let mut inserted = 0;
        for record in records {
            if self.insert_if_absent(record)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Reads every record's id and resolved URL in ascending id order
    fn read_ordered_by_id(&self) -> StorageResult<Vec<UrlRecord>>;

    /// Overwrites the resolved URL of a single record
    fn update_resolved_url(&mut self, id: i64, value: &str) -> StorageResult<()>;

    /// Calendar date of the newest scan timestamp, if any record has one
    fn max_scan_date(&self) -> StorageResult<Option<NaiveDate>>;
}

/// Per-query resume cursor persistence
///
/// Stored values that fail cursor validation read back as absent.
pub trait CheckpointStore {
    fn get_checkpoint(&self, query: &str) -> StorageResult<Option<SearchCursor>>;

    /// Inserts or replaces the cursor for a query
    fn put_checkpoint(&mut self, query: &str, cursor: &SearchCursor) -> StorageResult<()>;

    fn clear_checkpoint(&mut self, query: &str) -> StorageResult<()>;
}

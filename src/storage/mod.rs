//! Storage module for persisting harvest data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Deduplicated insertion of harvested search results
//! - Ordered reads and in-place updates of resolved URLs for probing
//! - Per-query pagination checkpoints for crash-safe resumption

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CheckpointStore, RecordSink, StorageError, StorageResult};

use crate::HarvestError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// Missing parent directories are created first.
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteStorage::new(path)
}

/// A search result normalized for storage
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestedRecord {
    /// Stable identifier assigned by the search API
    pub external_id: String,
    pub source: String,
    pub proxy_type: String,
    pub task_url: Option<String>,
    pub page_url: Option<String>,
    pub score: Option<f64>,
    pub malicious: Option<bool>,
    pub country: Option<String>,
    pub ip: Option<String>,
    pub http_requests: Option<i64>,
    pub unique_ips: Option<i64>,
    /// Scan time reported by the API (RFC 3339)
    pub scan_timestamp: Option<String>,
    /// Local collection time, `%Y-%m-%dT%H:%M:%S`
    pub collected_at: String,
}

/// The slice of a stored record the prober reads and rewrites
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub id: i64,
    pub resolved_url: Option<String>,
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::search::SearchCursor;
use crate::state::Marker;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CheckpointStore, RecordSink, StorageError, StorageResult};
use crate::storage::{HarvestedRecord, UrlRecord};
use crate::HarvestError;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const INSERT_RECORD_SQL: &str = "INSERT OR IGNORE INTO urls
    (external_id, source, proxy_type, task_url, page_url, score, malicious, country, ip,
     http_requests, unique_ips, scan_timestamp, collected_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===== Statistics =====

    /// Total number of stored records
    pub fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Records whose resolved URL has been filled in upstream
    pub fn count_resolved(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE resolved_url IS NOT NULL AND resolved_url != ''",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Records whose resolved URL carries the given marker
    pub fn count_by_marker(&self, marker: Marker) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE LOWER(resolved_url) LIKE ?1 ESCAPE '\\'",
            params![marker.like_pattern()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Number of queries with a saved pagination cursor
    pub fn count_checkpoints(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM harvest_checkpoints", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }

    /// Looks up a record id by its external id
    pub fn find_id_by_external_id(&self, external_id: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM urls WHERE external_id = ?1",
                params![external_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

fn insert_record(conn: &Connection, record: &HarvestedRecord) -> StorageResult<bool> {
    let changed = conn.execute(
        INSERT_RECORD_SQL,
        params![
            record.external_id,
            record.source,
            record.proxy_type,
            record.task_url,
            record.page_url,
            record.score,
            record.malicious,
            record.country,
            record.ip,
            record.http_requests,
            record.unique_ips,
            record.scan_timestamp,
            record.collected_at,
        ],
    )?;
    Ok(changed == 1)
}

impl RecordSink for SqliteStorage {
    fn insert_if_absent(&mut self, record: &HarvestedRecord) -> StorageResult<bool> {
        insert_record(&self.conn, record)
    }

    fn insert_batch_if_absent(&mut self, records: &[HarvestedRecord]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for record in records {
            if insert_record(&tx, record)? {
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn read_ordered_by_id(&self) -> StorageResult<Vec<UrlRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, resolved_url FROM urls ORDER BY id ASC")?;

        let records = stmt
            .query_map([], |row| {
                Ok(UrlRecord {
                    id: row.get(0)?,
                    resolved_url: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn update_resolved_url(&mut self, id: i64, value: &str) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE urls SET resolved_url = ?1 WHERE id = ?2",
            params![value, id],
        )?;
        if changed == 0 {
            return Err(StorageError::RecordNotFound(id));
        }
        Ok(())
    }

    fn max_scan_date(&self) -> StorageResult<Option<NaiveDate>> {
        let date: Option<String> = self.conn.query_row(
            "SELECT DATE(MAX(scan_timestamp)) FROM urls",
            [],
            |row| row.get(0),
        )?;

        Ok(date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()))
    }
}

impl CheckpointStore for SqliteStorage {
    fn get_checkpoint(&self, query: &str) -> StorageResult<Option<SearchCursor>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT search_after FROM harvest_checkpoints WHERE query = ?1",
                params![query],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let cursor = SearchCursor::from_json(&raw);
        if cursor.is_none() {
            tracing::debug!("Ignoring malformed checkpoint for {:?}: {}", query, raw);
        }
        Ok(cursor)
    }

    fn put_checkpoint(&mut self, query: &str, cursor: &SearchCursor) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO harvest_checkpoints (query, search_after, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(query) DO UPDATE SET
                search_after = excluded.search_after,
                updated_at = excluded.updated_at",
            params![query, cursor.to_json()?, now],
        )?;
        Ok(())
    }

    fn clear_checkpoint(&mut self, query: &str) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM harvest_checkpoints WHERE query = ?1",
            params![query],
        )?;
        Ok(())
    }
}

//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Proxy-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Harvested search results, later enriched by downstream stages
CREATE TABLE IF NOT EXISTS urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT UNIQUE,
    source TEXT NOT NULL,
    proxy_type TEXT,
    task_url TEXT,
    page_url TEXT,
    resolved_url TEXT,
    score REAL,
    malicious INTEGER,
    country TEXT,
    ip TEXT,
    http_requests INTEGER,
    unique_ips INTEGER,
    scan_timestamp TEXT,
    collected_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_urls_scan_timestamp ON urls(scan_timestamp);

-- Per-query pagination cursor, JSON array [ts13, external_id]
CREATE TABLE IF NOT EXISTS harvest_checkpoints (
    query TEXT PRIMARY KEY,
    search_after TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

//! Statistics over the record store
//!
//! This module provides functionality for extracting and displaying
//! harvest and probing statistics from the storage layer.

use crate::state::Marker;
use crate::storage::{RecordSink, SqliteStorage};
use crate::HarvestError;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Record store statistics summary
#[derive(Debug, Clone)]
pub struct RecordStatistics {
    /// Total number of harvested records
    pub total_records: u64,

    /// Records with a resolved URL filled in upstream
    pub resolved: u64,

    /// Count of records by terminal marker
    pub by_marker: HashMap<Marker, u64>,

    /// Queries with a saved pagination cursor
    pub checkpoints: u64,

    /// Calendar date of the newest scan
    pub newest_scan: Option<NaiveDate>,
}

impl RecordStatistics {
    /// Number of records carrying any marker
    pub fn marked(&self) -> u64 {
        self.by_marker.values().sum()
    }

    pub fn marker_count(&self, marker: Marker) -> u64 {
        self.by_marker.get(&marker).copied().unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(RecordStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &SqliteStorage) -> Result<RecordStatistics, HarvestError> {
    let mut by_marker = HashMap::new();
    for marker in Marker::all() {
        let count = storage.count_by_marker(marker)?;
        if count > 0 {
            by_marker.insert(marker, count);
        }
    }

    Ok(RecordStatistics {
        total_records: storage.count_records()?,
        resolved: storage.count_resolved()?,
        by_marker,
        checkpoints: storage.count_checkpoints()?,
        newest_scan: storage.max_scan_date()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RecordStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Resolved URLs: {}", stats.resolved);
    match stats.newest_scan {
        Some(date) => println!("  Newest scan date: {}", date),
        None => println!("  Newest scan date: -"),
    }
    println!("  Saved checkpoints: {}", stats.checkpoints);
    println!();

    println!("Probe Markers:");
    for marker in Marker::all() {
        let count = stats.marker_count(marker);
        let percentage = if stats.resolved > 0 {
            (count as f64 / stats.resolved as f64) * 100.0
        } else {
            0.0
        };
        println!("  ({}): {} ({:.1}%)", marker.tag(), count, percentage);
    }
    println!();

    println!(
        "Unmarked resolved URLs: {}",
        stats.resolved.saturating_sub(stats.marked())
    );
}

//! Output module for run reports and store statistics
//!
//! This module handles:
//! - Printing per-day harvest reports
//! - Recording record store statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, RecordStatistics};

use crate::search::HarvestReport;
use chrono::NaiveDate;

/// Prints the per-day results of a daily collection
pub fn print_daily_reports(reports: &[(NaiveDate, HarvestReport)]) {
    println!("=== Daily Collection ===\n");
    for (day, report) in reports {
        println!(
            "  {}: {} new records over {} page(s), stopped by {}",
            day, report.inserted, report.pages, report.stop
        );
    }
    println!();
    println!("Total new records: {}", total_inserted(reports));
}

/// Sum of new records across daily reports
pub fn total_inserted(reports: &[(NaiveDate, HarvestReport)]) -> usize {
    reports.iter().map(|(_, r)| r.inserted).sum()
}

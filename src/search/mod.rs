//! Search API harvesting
//!
//! This module contains:
//! - Wire types for the search API response
//! - The pagination cursor and its validation rules
//! - The page client with credential rotation and backoff
//! - The harvester driving single-query and daily collection

mod client;
mod cursor;
mod harvester;
mod types;

pub use client::{ResponseClass, SearchClient};
pub use cursor::{looks_like_external_id, normalize_ms13, SearchCursor};
pub use harvester::{
    daily_query, days_to_collect, today_at_offset, HarvestReport, SearchHarvester, StopReason,
};
pub use types::{SearchItem, SearchResponse, SOURCE_LABEL};

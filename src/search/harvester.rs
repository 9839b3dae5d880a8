//! Paginated harvesting of search results
//!
//! One `harvest` call walks a single query page by page, committing records
//! and then the next cursor after every page. `harvest_daily` runs that walk
//! once per calendar day, newest day first.

use crate::config::SearchConfig;
use crate::search::client::SearchClient;
use crate::search::cursor::SearchCursor;
use crate::storage::{CheckpointStore, RecordSink};
use crate::HarvestError;
use chrono::{FixedOffset, NaiveDate, Utc};
use std::fmt;
use std::time::Duration;

/// Why a single-query harvest stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page yielded no usable cursor
    EndOfResults,
    /// Too many consecutive pages brought nothing new
    EmptyStreak,
    /// The page limit was reached
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EndOfResults => "end of results",
            Self::EmptyStreak => "empty-page streak",
            Self::PageLimit => "page limit",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one query's harvest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub pages: u32,
    pub inserted: usize,
    pub stop: StopReason,
}

/// Drives the search API through a record store
pub struct SearchHarvester {
    client: SearchClient,
    base_query: String,
    proxy_hint: Option<String>,
    page_size: u32,
    max_pages: u32,
    empty_page_streak: u32,
    page_delay: Duration,
    utc_offset_hours: i32,
}

impl SearchHarvester {
    /// Creates a harvester with a fresh credential rotator
    pub fn from_config(config: &SearchConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            client: SearchClient::from_config(config)?,
            base_query: config.query.clone(),
            proxy_hint: config
                .proxy_type
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            page_size: config.page_size,
            max_pages: config.max_pages,
            empty_page_streak: config.empty_page_streak.max(1),
            page_delay: Duration::from_millis(config.page_delay_ms),
            utc_offset_hours: config.utc_offset_hours,
        })
    }

    /// Harvests one query, resuming from its checkpoint if one is stored
    ///
    /// # Arguments
    ///
    /// * `storage` - Record and checkpoint store
    /// * `query` - Query text, also the checkpoint key
    /// * `max_pages` - Upper bound on pages fetched in this call
    /// * `page_size` - Results requested per page
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestReport)` - Pages fetched, new records, and why it stopped
    /// * `Err(HarvestError)` - A fatal API status, credential exhaustion, or a storage failure
    pub async fn harvest<S>(
        &mut self,
        storage: &mut S,
        query: &str,
        max_pages: u32,
        page_size: u32,
    ) -> Result<HarvestReport, HarvestError>
    where
        S: RecordSink + CheckpointStore,
    {
        let mut cursor = storage.get_checkpoint(query)?;
        match &cursor {
            Some(c) => tracing::info!("Resuming {:?} from {}", query, c.to_param()),
            None => tracing::info!("Starting {:?} from the newest results", query),
        }

        let mut pages = 0;
        let mut inserted = 0;
        let mut streak = 0;

        while pages < max_pages {
            let response = self
                .client
                .fetch_page(query, page_size, cursor.as_ref())
                .await?;
            pages += 1;

            if pages == 1 {
                if let Some(total) = response.total {
                    tracing::info!("{:?} matches {} results", query, total);
                }
            }

            let records: Vec<_> = response
                .results
                .iter()
                .filter_map(|item| {
                    let record = item.to_record(self.proxy_hint.as_deref());
                    if record.is_none() {
                        tracing::debug!("Skipping result without an id");
                    }
                    record
                })
                .collect();

            let page_inserted = storage.insert_batch_if_absent(&records)?;
            inserted += page_inserted;

            cursor = SearchCursor::from_results(&response.results);
            if let Some(next) = &cursor {
                storage.put_checkpoint(query, next)?;
            }

            tracing::info!(
                "Page {}: {} results, {} new (total {})",
                pages,
                response.results.len(),
                page_inserted,
                inserted
            );

            if page_inserted == 0 && !response.results.is_empty() {
                streak += 1;
            } else {
                streak = 0;
            }

            if streak >= self.empty_page_streak {
                tracing::info!("{} consecutive pages with no new data; stopping", streak);
                return Ok(HarvestReport {
                    pages,
                    inserted,
                    stop: StopReason::EmptyStreak,
                });
            }

            if cursor.is_none() {
                tracing::info!("No further cursor; {:?} is complete", query);
                return Ok(HarvestReport {
                    pages,
                    inserted,
                    stop: StopReason::EndOfResults,
                });
            }

            tokio::time::sleep(self.page_delay).await;
        }

        Ok(HarvestReport {
            pages,
            inserted,
            stop: StopReason::PageLimit,
        })
    }

    /// Runs one harvest per day from today back to the newest stored scan date
    ///
    /// Each day's checkpoint is cleared first so every day paginates from its
    /// newest result. A fatal error aborts the remaining days.
    pub async fn harvest_daily<S>(
        &mut self,
        storage: &mut S,
    ) -> Result<Vec<(NaiveDate, HarvestReport)>, HarvestError>
    where
        S: RecordSink + CheckpointStore,
    {
        let today = today_at_offset(self.utc_offset_hours);
        let stop = storage.max_scan_date()?;
        let days = days_to_collect(today, stop);

        tracing::info!(
            "Daily collection: {} day(s), {} down to {}",
            days.len(),
            today,
            days.last().copied().unwrap_or(today)
        );

        let mut reports = Vec::with_capacity(days.len());
        for day in days {
            let query = daily_query(&self.base_query, day);
            tracing::info!("Collecting {} with query {:?}", day, query);

            storage.clear_checkpoint(&query)?;
            let report = self
                .harvest(storage, &query, self.max_pages, self.page_size)
                .await?;

            tracing::info!("{}: inserted {} ({})", day, report.inserted, report.stop);
            reports.push((day, report));
        }

        Ok(reports)
    }
}

/// Calendar date at a fixed offset from UTC
pub fn today_at_offset(hours: i32) -> NaiveDate {
    let now = Utc::now();
    FixedOffset::east_opt(hours * 3600)
        .map(|offset| now.with_timezone(&offset).date_naive())
        .unwrap_or_else(|| now.date_naive())
}

/// Days to collect in descending order, `today` down to `stop` inclusive
///
/// An absent `stop`, or one later than `today`, yields only `today`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use proxy_harvest::search::days_to_collect;
///
/// let today = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
/// let stop = NaiveDate::from_ymd_opt(2024, 5, 1);
/// assert_eq!(days_to_collect(today, stop).len(), 3);
/// assert_eq!(days_to_collect(today, None), vec![today]);
/// ```
pub fn days_to_collect(today: NaiveDate, stop: Option<NaiveDate>) -> Vec<NaiveDate> {
    let stop = match stop {
        Some(stop) if stop <= today => stop,
        _ => return vec![today],
    };

    let mut days = Vec::new();
    let mut day = today;
    while day >= stop {
        days.push(day);
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    days
}

/// Scopes a base query to one calendar day
pub fn daily_query(base: &str, day: NaiveDate) -> String {
    format!("{} date:{}", base.trim(), day.format("%Y-%m-%d"))
}

//! Per-record subpage probing pass
//!
//! Records are visited in ascending id order. Path-less, unmarked records are
//! resolved to exactly one terminal marker; every unmarked record then feeds
//! its validated path into the observation window, so later targets are
//! probed against the paths seen most recently before them.

use crate::config::ProbeConfig;
use crate::probe::race::race_candidates;
use crate::probe::Probe;
use crate::state::{Marker, ObservationWindow};
use crate::storage::{RecordSink, UrlRecord};
use crate::url::{is_probe_target, observed_subpath, origin_of};
use crate::HarvestError;
use std::fmt;

/// Counters for one probing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    /// Records visited
    pub processed: usize,
    /// Records that needed probing
    pub targets: usize,
    /// Records written back
    pub updated: usize,
    pub access: usize,
    pub sub_found: usize,
    pub sub_missing: usize,
    /// Records left unmarked because of an error
    pub errors: usize,
}

impl ProbeSummary {
    fn record(&mut self, marker: Marker) {
        match marker {
            Marker::Access => self.access += 1,
            Marker::SubpageFound => self.sub_found += 1,
            Marker::SubpageMissing => self.sub_missing += 1,
        }
    }
}

impl fmt::Display for ProbeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} targets={} updated={} access={} sub_o={} sub_x={} errors={}",
            self.processed,
            self.targets,
            self.updated,
            self.access,
            self.sub_found,
            self.sub_missing,
            self.errors
        )
    }
}

/// Drives one probing pass over a record store
pub struct SubpageProber<P: Probe> {
    probe: P,
    window: ObservationWindow,
    workers: usize,
    dry_run: bool,
    limit: Option<usize>,
}

impl<P: Probe> SubpageProber<P> {
    pub fn new(probe: P, config: &ProbeConfig) -> Self {
        Self {
            probe,
            window: ObservationWindow::new(config.window),
            workers: config.workers.max(1),
            dry_run: config.dry_run,
            limit: config.limit,
        }
    }

    /// Paths observed so far in this pass
    pub fn window(&self) -> &ObservationWindow {
        &self.window
    }

    /// Runs a full pass over the store
    ///
    /// Only reading the record list can fail the pass; per-record failures are
    /// logged and counted, and the record stays unmarked.
    pub async fn run<S: RecordSink>(
        &mut self,
        storage: &mut S,
    ) -> Result<ProbeSummary, HarvestError> {
        let mut records = storage.read_ordered_by_id()?;
        if let Some(limit) = self.limit {
            let skip = records.len().saturating_sub(limit);
            records.drain(..skip);
        }

        let mut summary = ProbeSummary::default();
        tracing::info!(
            "Probing {} records (window={}, workers={}{})",
            records.len(),
            self.window.capacity(),
            self.workers,
            if self.dry_run { ", dry run" } else { "" }
        );

        for record in &records {
            summary.processed += 1;
            let resolved = record.resolved_url.as_deref();

            if is_probe_target(resolved) {
                summary.targets += 1;
                if let Err(e) = self.process_target(storage, record, &mut summary).await {
                    tracing::error!("Record {}: {}", record.id, e);
                    summary.errors += 1;
                }
            }

            if let Some(path) = observed_subpath(resolved) {
                self.window.push(path);
            }
        }

        tracing::info!("Probe pass finished: {}", summary);
        Ok(summary)
    }

    async fn process_target<S: RecordSink>(
        &self,
        storage: &mut S,
        record: &UrlRecord,
        summary: &mut ProbeSummary,
    ) -> Result<(), HarvestError> {
        let original = record.resolved_url.as_deref().unwrap_or_default();
        let (marker, value) = self.resolve(original).await;

        if self.dry_run {
            tracing::info!("[dry run] id={} -> {}", record.id, value);
        } else {
            storage.update_resolved_url(record.id, &value)?;
            summary.updated += 1;
            tracing::debug!("id={} -> {}", record.id, value);
        }

        summary.record(marker);
        Ok(())
    }

    /// Decides the marked value for a target URL
    async fn resolve(&self, original: &str) -> (Marker, String) {
        let direct = self.probe.probe(original).await;
        if direct.ok {
            return (Marker::Access, Marker::Access.apply(original));
        }

        let Some(origin) = origin_of(original) else {
            tracing::debug!("No origin for {}", original);
            return (Marker::SubpageMissing, Marker::SubpageMissing.apply(original));
        };

        let candidates = self.window.candidates();
        match race_candidates(&self.probe, &origin, &candidates, self.workers).await {
            Some(hit) => {
                tracing::info!("{} + {} -> {}", origin, hit.subpath, hit.url);
                (Marker::SubpageFound, Marker::SubpageFound.apply(&hit.url))
            }
            None => (Marker::SubpageMissing, Marker::SubpageMissing.apply(original)),
        }
    }
}

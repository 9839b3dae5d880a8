//! Concurrent candidate race
//!
//! Candidates are probed through a bounded `buffer_unordered` pool. The single
//! consumer keeps the successful hit with the smallest recency index and stops
//! polling once the first candidate has succeeded, dropping whatever is still
//! in flight.

use crate::probe::Probe;
use crate::url::build_candidate_url;
use futures::stream::{self, StreamExt};

/// Winning candidate of a race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateHit {
    /// Position in recency order; 0 is the most recent path
    pub index: usize,
    pub url: String,
    pub subpath: String,
}

/// Probes `origin + subpath` for every candidate and returns the best success
///
/// # Arguments
///
/// * `probe` - Liveness check
/// * `origin` - `scheme://host[:port]` of the target
/// * `subpaths` - Candidates in recency order
/// * `workers` - Maximum probes in flight
pub async fn race_candidates<P>(
    probe: &P,
    origin: &str,
    subpaths: &[String],
    workers: usize,
) -> Option<CandidateHit>
where
    P: Probe + ?Sized,
{
    let jobs: Vec<(usize, String, String)> = subpaths
        .iter()
        .enumerate()
        .filter_map(|(index, subpath)| {
            build_candidate_url(origin, subpath).map(|url| (index, subpath.clone(), url))
        })
        .collect();

    // Nothing can beat a success at the first buildable position
    let unbeatable = jobs.first()?.0;

    let mut results = stream::iter(jobs)
        .map(|(index, subpath, url)| async move {
            let outcome = probe.probe(&url).await;
            tracing::debug!("Candidate #{} {} -> {}", index, url, outcome.status);
            (outcome.ok, CandidateHit { index, url, subpath })
        })
        .buffer_unordered(workers.max(1));

    let mut best: Option<CandidateHit> = None;
    while let Some((ok, hit)) = results.next().await {
        if !ok {
            continue;
        }
        if best.as_ref().map_or(true, |b| hit.index < b.index) {
            best = Some(hit);
        }
        if best.as_ref().map(|b| b.index) == Some(unbeatable) {
            break;
        }
    }

    best
}

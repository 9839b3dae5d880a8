//! Subpage probing
//!
//! This module contains:
//! - The `Probe` liveness contract and its HTTP implementation
//! - The bounded concurrent race over window candidates
//! - The per-record probing pass that writes terminal markers

mod http;
mod prober;
mod race;

pub use http::{is_reachable_status, HttpProbe};
pub use prober::{ProbeSummary, SubpageProber};
pub use race::{race_candidates, CandidateHit};

use async_trait::async_trait;

/// Result of a single liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub ok: bool,
    /// Final HTTP status, or 0 when no response arrived
    pub status: u16,
}

impl ProbeOutcome {
    pub fn from_status(status: u16) -> Self {
        Self {
            ok: is_reachable_status(status),
            status,
        }
    }

    /// Transport failure: timeout, DNS, TLS, malformed URL
    pub fn unreachable() -> Self {
        Self { ok: false, status: 0 }
    }
}

/// Single-URL liveness check
///
/// Implementations never fail; every problem maps to an unsuccessful outcome.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

//! Proxy-Harvest: discovery and harvesting of proxy-wrapped URLs
//!
//! This crate pages through a web-scan search API with credential rotation and
//! crash-resumable checkpoints, then probes path-less resolved destinations for
//! reachable subpages using a sliding window of recently observed paths.

pub mod config;
pub mod output;
pub mod probe;
pub mod search;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvesting and probing operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Search API rejected the request with HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("All API credentials failed after {attempts} attempts")]
    CredentialsExhausted { attempts: u32 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if this error must abort the enclosing harvest schedule
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::CredentialsExhausted { .. } | Self::Config(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No usable API credentials provided")]
    NoCredentials,
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use probe::{HttpProbe, Probe, ProbeOutcome, ProbeSummary, SubpageProber};
pub use search::{HarvestReport, SearchCursor, SearchHarvester, StopReason};
pub use state::{CredentialRotator, Marker, ObservationWindow};
pub use url::normalize_subpath;

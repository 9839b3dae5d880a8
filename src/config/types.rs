use serde::Deserialize;

/// Main configuration structure for Proxy-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    pub output: OutputConfig,
}

/// Search API harvesting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint, e.g. `https://urlscan.io/api/v1/search/`
    #[serde(rename = "api-url", default = "default_api_url")]
    pub api_url: String,

    /// Credential pool, rotated circularly on rate limiting
    #[serde(rename = "api-keys")]
    pub api_keys: Vec<String>,

    /// Base query text; the daily schedule appends a `date:` filter
    pub query: String,

    /// Proxy classification forced onto every harvested record
    #[serde(rename = "proxy-type", default)]
    pub proxy_type: Option<String>,

    /// Results requested per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Maximum pages fetched per query
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Consecutive pages without new records before a query stops
    #[serde(rename = "empty-page-streak", default = "default_empty_page_streak")]
    pub empty_page_streak: u32,

    /// Wait after 5xx/network failures, and after a 429 without Retry-After (seconds)
    #[serde(rename = "backoff-secs", default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Delay between successful pages (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Per-request timeout for the search API (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Offset from UTC defining "today" for the daily schedule
    #[serde(rename = "utc-offset-hours", default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

/// Subpage probing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Capacity of the observation window
    #[serde(default = "default_window")]
    pub window: usize,

    /// Liveness probe timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,

    /// Concurrent candidate probes per record
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// User-Agent header sent with probes
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Compute outcomes without writing them back
    #[serde(rename = "dry-run", default)]
    pub dry_run: bool,

    /// Only process the newest N records
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            timeout_secs: default_probe_timeout_secs(),
            workers: default_workers(),
            user_agent: default_user_agent(),
            dry_run: false,
            limit: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_api_url() -> String {
    "https://urlscan.io/api/v1/search/".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    1000
}

fn default_empty_page_streak() -> u32 {
    5
}

fn default_backoff_secs() -> u64 {
    5
}

fn default_page_delay_ms() -> u64 {
    200
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_utc_offset_hours() -> i32 {
    9
}

fn default_window() -> usize {
    50
}

fn default_probe_timeout_secs() -> u64 {
    4
}

fn default_workers() -> usize {
    8
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; SubpageProbe/1.0)".to_string()
}

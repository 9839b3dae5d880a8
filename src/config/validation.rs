use crate::config::types::{Config, OutputConfig, ProbeConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound the search API accepts for a single page
const MAX_PAGE_SIZE: u32 = 10_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_probe_config(&config.probe)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates search harvesting configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let api_url = Url::parse(&config.api_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-url: {}", e)))?;
    if api_url.scheme() != "http" && api_url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "api-url must use http or https, got '{}'",
            api_url.scheme()
        )));
    }

    if config.api_keys.iter().all(|key| key.trim().is_empty()) {
        return Err(ConfigError::NoCredentials);
    }

    if config.query.trim().is_empty() {
        return Err(ConfigError::Validation("query cannot be empty".to_string()));
    }

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    require_positive("max-pages", config.max_pages as u64)?;
    require_positive("empty-page-streak", config.empty_page_streak as u64)?;
    require_positive("request-timeout-secs", config.request_timeout_secs)?;

    if !(-14..=14).contains(&config.utc_offset_hours) {
        return Err(ConfigError::Validation(format!(
            "utc-offset-hours must be between -14 and 14, got {}",
            config.utc_offset_hours
        )));
    }

    Ok(())
}

/// Validates probing configuration
fn validate_probe_config(config: &ProbeConfig) -> Result<(), ConfigError> {
    require_positive("window", config.window as u64)?;
    require_positive("workers", config.workers as u64)?;
    require_positive("timeout-secs", config.timeout_secs)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.limit == Some(0) {
        return Err(ConfigError::Validation(
            "limit must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn require_positive(name: &str, value: u64) -> Result<(), ConfigError> {
    if value < 1 {
        return Err(ConfigError::Validation(format!(
            "{} must be >= 1, got {}",
            name, value
        )));
    }
    Ok(())
}

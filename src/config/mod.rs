//! Configuration module for Proxy-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use proxy_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting query: {}", config.search.query);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, OutputConfig, ProbeConfig, SearchConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

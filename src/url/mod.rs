//! URL handling module for Proxy-Harvest
//!
//! This module provides subpath validation, path/origin extraction, probe
//! candidate construction, and proxy host classification.

mod parts;
mod proxy;
mod subpath;

// Re-export main functions
pub use parts::{extract_path, host_of, is_root_path, origin_of};
pub use proxy::{classify_proxy_host, UNKNOWN_PROXY};
pub use subpath::{build_candidate_url, normalize_subpath};

use crate::state::Marker;

/// Returns true if a resolved URL still needs subpage probing
///
/// A target has a resolved URL, carries no terminal marker, and has an empty or
/// root path.
///
/// # Examples
///
/// ```
/// use proxy_harvest::url::is_probe_target;
///
/// assert!(is_probe_target(Some("https://example.com")));
/// assert!(is_probe_target(Some("https://example.com/")));
/// assert!(!is_probe_target(Some("https://example.com/path")));
/// assert!(!is_probe_target(Some("https://example.com (sub_o)")));
/// assert!(!is_probe_target(None));
/// ```
pub fn is_probe_target(resolved_url: Option<&str>) -> bool {
    let Some(url) = resolved_url.filter(|u| !u.trim().is_empty()) else {
        return false;
    };

    if Marker::is_marked(url) {
        return false;
    }

    extract_path(url).map(|p| is_root_path(&p)).unwrap_or(false)
}

/// Extracts the subpath a record contributes to the observation window
///
/// Marked records contribute nothing; unmarked ones contribute their validated
/// path, if any.
pub fn observed_subpath(resolved_url: Option<&str>) -> Option<String> {
    let url = resolved_url.filter(|u| !u.trim().is_empty())?;
    if Marker::is_marked(url) {
        return None;
    }

    normalize_subpath(&extract_path(url)?)
}

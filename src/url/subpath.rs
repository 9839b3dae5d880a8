use url::Url;

/// Substrings that make a dotted first segment acceptable (`/api.v2`, `/admin.x`)
const ALLOWED_SEGMENT_KEYWORDS: &[&str] = &["api", "admin", "user", "www", "app"];

/// Normalizes a candidate subpath, or rejects it
///
/// # Rejection Rules
///
/// 1. Empty, whitespace-only, or `/`
/// 2. Absolute URLs (`http://`, `https://`) or anything containing `://`
/// 3. Mangled schemes glued onto the path (`/https:...`, `/http:...`)
/// 4. A `:` in a path that starts with neither `/` nor `http`
/// 5. A first segment containing `.` without an allow-listed keyword; these are
///    foreign domains embedded in the path (`/google.com/path`)
///
/// Accepted paths are returned with a leading `/`.
///
/// # Examples
///
/// ```
/// use proxy_harvest::url::normalize_subpath;
///
/// assert_eq!(normalize_subpath("/api/users"), Some("/api/users".to_string()));
/// assert_eq!(normalize_subpath("path"), Some("/path".to_string()));
/// assert_eq!(normalize_subpath("/google.com/path"), None);
/// assert_eq!(normalize_subpath("/"), None);
/// ```
pub fn normalize_subpath(raw: &str) -> Option<String> {
    let path = raw.trim();
    if path.is_empty() || path == "/" {
        return None;
    }

    if path.starts_with("http://") || path.starts_with("https://") {
        return None;
    }

    if path.contains("://") || path.starts_with("/https:") || path.starts_with("/http:") {
        return None;
    }

    if path.contains(':') && !path.starts_with('/') && !path.starts_with("http") {
        return None;
    }

    let first_segment = path
        .strip_prefix('/')
        .unwrap_or(path)
        .split('/')
        .next()
        .unwrap_or("");
    if first_segment.contains('.') {
        let lowered = first_segment.to_lowercase();
        if !ALLOWED_SEGMENT_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(keyword))
        {
            return None;
        }
    }

    if path.starts_with('/') {
        Some(path.to_string())
    } else {
        Some(format!("/{}", path))
    }
}

/// Joins an origin and a subpath into a probe candidate
///
/// Leading slashes on the subpath are collapsed so that `//host` can never
/// escape the origin as a scheme-relative reference.
///
/// # Returns
///
/// * `Some(String)` - The candidate URL, e.g. `https://example.com/path/to/page`
/// * `None` - The origin does not parse as a URL
pub fn build_candidate_url(origin: &str, subpath: &str) -> Option<String> {
    let base = Url::parse(&format!("{}/", origin.trim_end_matches('/'))).ok()?;
    let relative = format!("/{}", subpath.trim_start_matches('/'));
    base.join(&relative).ok().map(|url| url.to_string())
}

use url::Url;

/// Extracts the lowercase host from a URL string
///
/// # Examples
///
/// ```
/// use proxy_harvest::url::host_of;
///
/// let host = host_of("https://EXAMPLE-com.translate.goog/x");
/// assert_eq!(host, Some("example-com.translate.goog".to_string()));
/// assert_eq!(host_of("not a url"), None);
/// ```
pub fn host_of(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()?
        .host_str()
        .map(|h| h.to_lowercase())
}

/// Extracts the path component of a resolved URL
///
/// Returns `None` when the value does not parse as an absolute URL. Parsed
/// http(s) URLs always carry at least `/` as their path.
pub fn extract_path(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str.trim()).ok()?;
    Some(url.path().to_string())
}

/// Returns `scheme://host[:port]` for a URL, or `None` if either part is missing
///
/// Default ports are omitted, explicit non-default ports are kept.
pub fn origin_of(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str.trim()).ok()?;
    let host = url.host_str()?;
    if host.is_empty() {
        return None;
    }

    match url.port() {
        Some(port) => Some(format!("{}://{}:{}", url.scheme(), host, port)),
        None => Some(format!("{}://{}", url.scheme(), host)),
    }
}

/// Returns true if a path counts as "no subpage" (`""` or `/`)
pub fn is_root_path(path: &str) -> bool {
    path.is_empty() || path == "/"
}

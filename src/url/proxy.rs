/// Known proxy front-ends and the host suffixes that identify them
struct ProxyPattern {
    proxy_type: &'static str,
    host_suffixes: &'static [&'static str],
}

const PROXY_PATTERNS: &[ProxyPattern] = &[ProxyPattern {
    proxy_type: "google_translate",
    host_suffixes: &["translate.goog"],
}];

/// Classification used when no pattern matches
pub const UNKNOWN_PROXY: &str = "none";

/// Classifies a (lowercase) host by the proxy service that served it
///
/// A suffix matches the bare host itself or any subdomain of it.
///
/// # Examples
///
/// ```
/// use proxy_harvest::url::classify_proxy_host;
///
/// assert_eq!(classify_proxy_host("example-com.translate.goog"), "google_translate");
/// assert_eq!(classify_proxy_host("example.com"), "none");
/// ```
pub fn classify_proxy_host(host: &str) -> &'static str {
    let host = host.to_lowercase();
    PROXY_PATTERNS
        .iter()
        .find(|pattern| {
            pattern
                .host_suffixes
                .iter()
                .any(|suffix| host_has_suffix(&host, suffix))
        })
        .map(|pattern| pattern.proxy_type)
        .unwrap_or(UNKNOWN_PROXY)
}

fn host_has_suffix(host: &str, suffix: &str) -> bool {
    host == suffix || host.ends_with(&format!(".{}", suffix))
}

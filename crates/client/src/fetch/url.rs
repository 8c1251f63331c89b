//! URL canonicalization and resolution against the app origin.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string so equal resources share one cache identity.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed.set_host(Some(&host)).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a request target against the app origin.
///
/// Absolute paths (`/manifest.json`) are joined onto the origin; anything
/// else goes through [`canonicalize`].
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.starts_with('/') && !trimmed.starts_with("//") {
        let joined = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        return canonicalize(joined.as_str());
    }

    canonicalize(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("https://example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://example.com#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://example.com?a=1&b=2").unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        let result = canonicalize("");
        assert!(matches!(result, Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_absolute_path() {
        let origin = url::Url::parse("https://app.mytender.io").unwrap();
        let url = resolve(&origin, "/index.html?t=1700000000000").unwrap();
        assert_eq!(url.as_str(), "https://app.mytender.io/index.html?t=1700000000000");
    }

    #[test]
    fn test_resolve_ignores_origin_path() {
        let origin = url::Url::parse("https://app.mytender.io/bids/").unwrap();
        let url = resolve(&origin, "/manifest.json").unwrap();
        assert_eq!(url.as_str(), "https://app.mytender.io/manifest.json");
    }

    #[test]
    fn test_resolve_absolute_url() {
        let origin = url::Url::parse("https://app.mytender.io").unwrap();
        let url = resolve(&origin, "https://CDN.example.com/font.woff2#x").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/font.woff2");
    }

    #[test]
    fn test_resolve_empty() {
        let origin = url::Url::parse("https://app.mytender.io").unwrap();
        assert!(matches!(resolve(&origin, " "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_canonicalize_complex_path() {
        let url = canonicalize("https://example.com/path/to/resource?query=value#fragment").unwrap();
        assert_eq!(url.path(), "/path/to/resource");
        assert_eq!(url.query(), Some("query=value"));
        assert_eq!(url.fragment(), None);
    }
}

//! URL canonicalization for scraped image links.

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

/// Canonicalize a URL string before it is downloaded or stored.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Protocol-relative `//host/...` becomes `https://host/...`
/// 3. Only http and https are accepted; a missing scheme is an error
/// 4. Lowercase the host, remove fragment (#...)
/// 5. Keep query string intact; CDN signatures live there
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str =
        if let Some(rest) = trimmed.strip_prefix("//") { format!("https://{rest}") } else { trimmed.to_string() };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if parsed.host_str().is_none() {
        return Err(UrlError::InvalidUrl(format!("missing host: {trimmed}")));
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a possibly relative `src` attribute against the page it came from.
pub fn resolve_against(base: &url::Url, src: &str) -> Option<url::Url> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") || src.starts_with("blob:") {
        return None;
    }
    let joined = base.join(src).ok()?;
    canonicalize(joined.as_str()).ok()
}

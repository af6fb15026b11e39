//! Page URL canonicalization.

use url::Url;

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

/// Canonicalize a page URL before fetching it.
///
/// Normalization steps:
/// 1. Trim surrounding whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove the fragment
/// 5. Drop a trailing slash after a file name (`results-previous.html/`),
///    which the site answers with a redirect
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    if let Some(path) = parsed.path().strip_suffix('/').map(str::to_string)
        && path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
    {
        parsed.set_path(&path);
    }

    Ok(parsed)
}

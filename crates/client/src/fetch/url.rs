//! URL canonicalization so equal resources share one request identity.

use offgrid_core::{Error, Request};

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

/// Canonicalize a URL string so equivalent spellings map to one identity.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
///
/// Scheme and host case are folded by `Url::parse` itself.
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

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Build an intercepted request from a method and a raw URL.
///
/// # Errors
///
/// Returns `Error::InvalidUrl` when the URL cannot be canonicalized and
/// `Error::InvalidInput` when the method is not a valid HTTP token.
pub fn parse_request(method: &str, input: &str) -> Result<Request, Error> {
    let url = canonicalize(input).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    Request::new(method, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("example.com/app.js").unwrap();
        assert_eq!(url.as_str(), "https://example.com/app.js");
    }

    #[test]
    fn test_canonicalize_lowercase_host_keeps_path_case() {
        let url = canonicalize("https://EXAMPLE.COM/Assets/Logo.PNG").unwrap();
        assert_eq!(url.as_str(), "https://example.com/Assets/Logo.PNG");
    }

    #[test]
    fn test_canonicalize_drops_fragment_keeps_query() {
        let url = canonicalize("https://example.com/feed?b=2&a=1#latest").unwrap();
        assert_eq!(url.as_str(), "https://example.com/feed?b=2&a=1");
    }

    #[test]
    fn test_canonicalize_rejects_non_http() {
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_parse_request_identity_is_canonical() {
        let a = parse_request("get", "https://EXAMPLE.com/logo.png#top").unwrap();
        let b = parse_request("GET", "  https://example.com/logo.png ").unwrap();
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_parse_request_invalid_url() {
        let result = parse_request("GET", "ftp://example.com/file");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}

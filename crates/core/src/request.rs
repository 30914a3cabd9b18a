//! Intercepted requests and their cache identity.

use bytes::Bytes;
use url::Url;

use crate::Error;
use crate::cache::hash::compute_identity_key;

/// The safe retrieval method; the only one whose responses are ever stored.
pub const SAFE_METHOD: &str = "GET";

/// An outgoing request captured by the host.
///
/// The engine never mutates a request it is handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl Request {
    /// Build a request, normalizing the method to upper case.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the method is empty or is not an
    /// HTTP token.
    pub fn new(method: &str, url: Url) -> Result<Self, Error> {
        let method = method.trim();
        if method.is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }
        if !method.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)) {
            return Err(Error::InvalidInput(format!("invalid method: {method}")));
        }

        Ok(Self { method: method.to_ascii_uppercase(), url, headers: Vec::new(), body: None })
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: Url) -> Self {
        Self { method: SAFE_METHOD.to_string(), url, headers: Vec::new(), body: None }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// True when the method is the safe retrieval method.
    pub fn is_safe(&self) -> bool {
        self.method == SAFE_METHOD
    }

    /// The store key for this request.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity { method: self.method.clone(), url: self.url.to_string() }
    }
}

/// The `(method, absolute URL)` pair used as the store lookup key.
///
/// Two requests share an identity iff both components match exactly,
/// query string included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    pub method: String,
    pub url: String,
}

impl RequestIdentity {
    /// Content-addressed key used as the row key in a bucket.
    pub fn key(&self) -> String {
        compute_identity_key(&self.method, &self.url)
    }
}

impl std::fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_is_uppercased() {
        let req = Request::new("post", url("https://example.com/api")).unwrap();
        assert_eq!(req.method(), "POST");
        assert!(!req.is_safe());
    }

    #[test]
    fn test_empty_method_rejected() {
        let result = Request::new("  ", url("https://example.com/"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_method_rejected() {
        let result = Request::new("GE T", url("https://example.com/"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_identity_includes_query() {
        let a = Request::get(url("https://example.com/data?page=1")).identity();
        let b = Request::get(url("https://example.com/data?page=2")).identity();
        assert_ne!(a, b);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_identity_includes_method() {
        let get = Request::get(url("https://example.com/data")).identity();
        let head = Request::new("HEAD", url("https://example.com/data")).unwrap().identity();
        assert_ne!(get.key(), head.key());
    }

    #[test]
    fn test_identity_ignores_headers_and_body() {
        let plain = Request::get(url("https://example.com/a"));
        let decorated = plain.clone().with_header("accept", "text/html").with_body("x");
        assert_eq!(plain.identity(), decorated.identity());
    }
}

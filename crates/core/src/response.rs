//! Response snapshots.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// An immutable snapshot of a network result.
///
/// Every consumer gets its own copy through [`Response::duplicate`]; the
/// copy persisted to a bucket and the copy handed back to the caller carry
/// the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Set when the response was read back from a bucket.
    pub stored_at: Option<DateTime<Utc>>,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into(), stored_at: None }
    }

    /// An independent copy of this response.
    pub fn duplicate(&self) -> Self {
        Self {
            status: self.status,
            headers: self.headers.clone(),
            body: Bytes::copy_from_slice(&self.body),
            stored_at: self.stored_at,
        }
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// True when both responses carry the same status, headers and body.
    pub fn same_payload(&self, other: &Response) -> bool {
        self.status == other.status && self.headers == other.headers && self.body == other.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_byte_identical() {
        let original = Response::new(200, vec![("Content-Type".into(), "text/plain".into())], "hello");
        let copy = original.duplicate();
        assert!(copy.same_payload(&original));
        assert_ne!(copy.body.as_ptr(), original.body.as_ptr());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = Response::new(200, vec![("Content-Type".into(), "image/png".into())], Bytes::new());
        assert_eq!(resp.content_type(), Some("image/png"));
        assert_eq!(resp.header("x-missing"), None);
    }

    #[test]
    fn test_error_status_is_still_a_response() {
        let resp = Response::new(404, Vec::new(), "not found");
        assert_eq!(resp.status, 404);
        assert_eq!(&resp.body[..], b"not found");
    }
}

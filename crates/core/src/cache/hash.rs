//! Content-addressed request identity keys.

use sha2::{Digest, Sha256};

/// Compute the row key for a `(method, absolute URL)` request identity.
pub fn compute_identity_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_identity_key("GET", "https://example.com/");
        let hash2 = compute_identity_key("GET", "https://example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_identity_key("GET", "https://example.com/");
        let head = compute_identity_key("HEAD", "https://example.com/");
        assert_ne!(get, head);
    }

    #[test]
    fn test_hash_no_boundary_collision() {
        let a = compute_identity_key("GET", "Xhttps://example.com/");
        let b = compute_identity_key("GETX", "https://example.com/");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_identity_key("GET", "https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

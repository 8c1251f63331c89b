//! Request identity hashing.

use sha2::{Digest, Sha256};

/// Compute the row key for a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
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
        let hash1 = compute_cache_key("GET", "https://app.example.com/");
        let hash2 = compute_cache_key("GET", "https://app.example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "https://app.example.com/upload");
        let post = compute_cache_key("POST", "https://app.example.com/upload");
        assert_ne!(get, post);
    }

    #[test]
    fn test_hash_separator_prevents_ambiguity() {
        assert_ne!(compute_cache_key("GE", "Thttps://a"), compute_cache_key("GET", "https://a"));
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://app.example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

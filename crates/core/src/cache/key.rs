//! Request identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::hash::compute_cache_key;

/// Identity of a request within a store: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    /// Stable hex digest used as the row key.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

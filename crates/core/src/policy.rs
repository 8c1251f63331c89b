//! Request classification.
//!
//! Routing is decided from the request alone: no cache state, no routing
//! table. The manager performs whatever I/O the returned [`Decision`] asks for.
//!
//! ### Always-fresh (network first, cache fallback)
//! - path is `/` or `/index.html`
//! - query string contains `t=` (cache busting)
//! - cache mode is `no-store`
//! - `cache-control` header is `no-cache`
//!
//! ### Never stored
//! - path contains `/api/`
//! - path ends with `.json`
//! - host contains `localhost`
//! - method other than GET

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::request::{Request, RequestCacheMode};

/// Paths of the bootstrap document.
pub const BOOTSTRAP_PATHS: &[&str] = &["/", "/index.html"];

/// Query fragment that marks a cache-busting request.
pub const CACHE_BUST_MARKER: &str = "t=";

/// Path fragment of backend API routes.
pub const API_ROUTE_MARKER: &str = "/api/";

/// Suffix of dynamic data documents.
pub const DYNAMIC_SUFFIX: &str = ".json";

/// Host fragment of local development servers.
pub const LOCAL_HOST_MARKER: &str = "localhost";

/// Where a request is answered from first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network-first",
            Strategy::CacheFirst => "cache-first",
        }
    }
}

/// Routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Decision {
    pub strategy: Strategy,
    /// Whether a qualifying network response may be written to the cache.
    pub cacheable: bool,
}

/// Whether the request must go to the network before the cache.
pub fn is_always_fresh(request: &Request) -> bool {
    BOOTSTRAP_PATHS.contains(&request.url.path())
        || request.url.query().is_some_and(|q| q.contains(CACHE_BUST_MARKER))
        || request.cache_mode == RequestCacheMode::NoStore
        || request.header("cache-control") == Some("no-cache")
}

/// Whether a successful response to this request may be stored.
pub fn is_cacheable(request: &Request) -> bool {
    let path = request.url.path();
    let host = request.url.host_str().unwrap_or_default();

    request.is_get()
        && !path.contains(API_ROUTE_MARKER)
        && !path.ends_with(DYNAMIC_SUFFIX)
        && !host.contains(LOCAL_HOST_MARKER)
}

/// Classify a request into a routing decision.
pub fn classify(request: &Request) -> Decision {
    let strategy = if is_always_fresh(request) { Strategy::NetworkFirst } else { Strategy::CacheFirst };
    Decision { strategy, cacheable: is_cacheable(request) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_bootstrap_paths_network_first() {
        assert_eq!(classify(&get("https://app.example.com/")).strategy, Strategy::NetworkFirst);
        assert_eq!(classify(&get("https://app.example.com/index.html")).strategy, Strategy::NetworkFirst);
        assert_eq!(classify(&get("https://app.example.com/bids/index.html")).strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_cache_bust_query_network_first() {
        let decision = classify(&get("https://app.example.com/assets/app.js?t=12345"));
        assert_eq!(decision.strategy, Strategy::NetworkFirst);
        assert!(decision.cacheable);

        let decision = classify(&get("https://app.example.com/assets/app.js?v=2"));
        assert_eq!(decision.strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_no_store_mode_network_first() {
        let request = get("https://app.example.com/images/logo.png").with_cache_mode(RequestCacheMode::NoStore);
        assert_eq!(classify(&request).strategy, Strategy::NetworkFirst);

        let request = get("https://app.example.com/images/logo.png").with_cache_mode(RequestCacheMode::Reload);
        assert_eq!(classify(&request).strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_no_cache_header_network_first() {
        let request = get("https://app.example.com/images/logo.png").with_header("Cache-Control", "no-cache");
        assert_eq!(classify(&request).strategy, Strategy::NetworkFirst);

        let request = get("https://app.example.com/images/logo.png").with_header("Cache-Control", "max-age=0");
        assert_eq!(classify(&request).strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_static_asset_cache_first_and_cacheable() {
        let decision = classify(&get("https://app.example.com/assets/index.abc123.js"));
        assert_eq!(decision, Decision { strategy: Strategy::CacheFirst, cacheable: true });
    }

    #[test]
    fn test_api_routes_not_cacheable() {
        let decision = classify(&get("https://app.example.com/api/get_bids_list"));
        assert_eq!(decision.strategy, Strategy::CacheFirst);
        assert!(!decision.cacheable);
    }

    #[test]
    fn test_json_suffix_not_cacheable() {
        assert!(!is_cacheable(&get("https://app.example.com/manifest.json")));
        assert!(is_cacheable(&get("https://app.example.com/docs/jsonschema.html")));
    }

    #[test]
    fn test_localhost_not_cacheable() {
        assert!(!is_cacheable(&get("http://localhost:5173/assets/app.js")));
        assert!(is_cacheable(&get("http://127.0.0.1:5173/assets/app.js")));
    }

    #[test]
    fn test_non_get_not_cacheable() {
        let request = get("https://app.example.com/upload").with_method("POST");
        assert!(!is_cacheable(&request));
    }
}

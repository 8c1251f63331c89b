//! offline_fetch tool implementation.
//!
//! Routes a request through the cache manager exactly as an intercepted page
//! request would be, and reports where the answer came from.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{CacheManager, Network, ResponseSource};
use shellcache_core::{CacheStorage, Error, RequestCacheMode, ResponseType, Strategy};

use super::json_result;

/// Input parameters for offline_fetch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchParams {
    /// Absolute path on the app origin (`/manifest.json`) or an absolute URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request cache mode (default: "default").
    #[serde(default)]
    pub cache_mode: Option<RequestCacheMode>,

    /// Extra request headers.
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Output structure for offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchOutput {
    /// Final URL of the response.
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    /// Routing strategy chosen for the request.
    pub route: Strategy,
    /// Whether a successful response may be stored.
    pub cacheable: bool,
    pub source: ResponseSource,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body as lossy UTF-8, cut at the preview limit.
    pub body: String,
    pub body_truncated: bool,
    /// Full body length in bytes.
    pub length: usize,
}

/// Implementation of the offline_fetch tool.
pub async fn fetch_impl<S, N>(
    manager: &CacheManager<S, N>, max_preview_bytes: usize, params: OfflineFetchParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network,
{
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let mut request = manager.request(&params.url)?;
    if let Some(method) = params.method.as_deref() {
        if method.trim().is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()).into());
        }
        request = request.with_method(method.trim());
    }
    if let Some(mode) = params.cache_mode {
        request = request.with_cache_mode(mode);
    }
    for (name, value) in params.headers.unwrap_or_default() {
        request = request.with_header(name, value);
    }

    let outcome = manager.handle_fetch(request).await?;
    let response = outcome.response;

    let length = response.body.len();
    let preview = &response.body[..length.min(max_preview_bytes)];

    let output = OfflineFetchOutput {
        content_type: response.content_type().map(str::to_string),
        url: response.url,
        status: response.status,
        status_text: response.status_text,
        response_type: response.response_type,
        route: outcome.decision.strategy,
        cacheable: outcome.decision.cacheable,
        source: outcome.source,
        headers: response.headers,
        body: String::from_utf8_lossy(preview).to_string(),
        body_truncated: length > max_preview_bytes,
        length,
    };

    json_result(&output)
}

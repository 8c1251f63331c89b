//! cache_get tool implementation.
//!
//! Looks up the stored entry for a request in the serving store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{CacheManager, Network};
use shellcache_core::{CacheStorage, Error, ResponseType};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Path on the app origin or absolute URL of the cached request.
    pub url: String,

    /// HTTP method of the cached request (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub method: String,
    /// Request URL the entry is keyed by.
    pub url: String,
    /// Final URL of the stored response.
    pub response_url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub length: usize,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl<S, N>(manager: &CacheManager<S, N>, params: CacheGetParams) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network,
{
    let mut request = manager.request(&params.url)?;
    if let Some(method) = params.method.as_deref() {
        request = request.with_method(method);
    }
    let key = request.key();

    let store = manager
        .serving_generation()
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("no active generation for {key}")))?;

    let entry = manager
        .storage()
        .get(&store, &key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let response = entry.response;
    let output = CacheGetOutput {
        store,
        method: entry.key.method,
        url: entry.key.url,
        content_type: response.content_type().map(str::to_string),
        response_url: response.url,
        status: response.status,
        status_text: response.status_text,
        response_type: response.response_type,
        length: response.body.len(),
        headers: response.headers,
        stored_at: entry.stored_at,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{CACHE_NAME, manager, output};
    use shellcache_client::testing::ScriptedNetwork;
    use shellcache_core::MemoryStorage;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_impl_missing() {
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::new(ScriptedNetwork::new())).await;
        let params = CacheGetParams { url: "/images/missing.png".into(), method: None };

        let err = get_impl(&manager, params).await.unwrap_err();
        assert!(err.message.contains("/images/missing.png"));
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::new(ScriptedNetwork::new())).await;
        let params = CacheGetParams { url: "/manifest.json".into(), method: None };

        let out: CacheGetOutput = output(&get_impl(&manager, params).await.unwrap());

        assert_eq!(out.store, CACHE_NAME);
        assert_eq!(out.method, "GET");
        assert_eq!(out.url, "https://app.example.com/manifest.json");
        assert_eq!(out.status, 200);
        assert_eq!(out.response_type, ResponseType::Basic);
        assert_eq!(out.length, "seed /manifest.json".len());
    }

    #[tokio::test]
    async fn test_get_impl_method_is_part_of_identity() {
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::new(ScriptedNetwork::new())).await;
        let params = CacheGetParams { url: "/manifest.json".into(), method: Some("HEAD".into()) };

        assert!(get_impl(&manager, params).await.is_err());
    }
}

//! cache_list tool implementation.
//!
//! Lists every generation store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{CacheManager, Network};
use shellcache_core::CacheStorage;

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
    /// This is the running manager's generation.
    pub current: bool,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub stores: Vec<StoreSummary>,
    /// Store currently answering reads, if any.
    pub serving: Option<String>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl<S, N>(manager: &CacheManager<S, N>) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network,
{
    let storage = manager.storage();
    let current = &manager.config().cache_name;

    let mut stores = Vec::new();
    for name in storage.store_names().await? {
        let entries = storage.entry_count(&name).await?;
        stores.push(StoreSummary { current: name == *current, name, entries });
    }

    let serving = manager.serving_generation().await?;
    json_result(&CacheListOutput { stores, serving })
}

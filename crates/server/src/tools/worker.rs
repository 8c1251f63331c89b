//! worker_message and worker_status tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shellcache_client::{CacheManager, Network, WorkerStatus};
use shellcache_core::CacheStorage;

use super::json_result;

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message payload, e.g. `{ "type": "SKIP_WAITING" }`.
    pub message: Value,
}

/// Output from the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    /// Whether the message was recognized and acted on.
    pub recognized: bool,
    pub status: WorkerStatus,
}

/// Implementation of the worker_message tool.
pub async fn message_impl<S, N>(
    manager: &CacheManager<S, N>, params: WorkerMessageParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network,
{
    let recognized = manager.on_message(&params.message).await?;
    let status = manager.status().await?;
    json_result(&WorkerMessageOutput { recognized, status })
}

/// Implementation of the worker_status tool.
pub async fn status_impl<S, N>(manager: &CacheManager<S, N>) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network,
{
    json_result(&manager.status().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{CACHE_NAME, manager, output};
    use serde_json::json;
    use shellcache_client::LifecycleState;
    use shellcache_client::testing::ScriptedNetwork;
    use shellcache_core::MemoryStorage;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_status_reports_active_generation() {
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::new(ScriptedNetwork::new())).await;

        let status: WorkerStatus = output(&status_impl(&manager).await.unwrap());
        assert_eq!(status.cache_name, CACHE_NAME);
        assert_eq!(status.state, LifecycleState::Active);
        assert_eq!(status.active_generation.as_deref(), Some(CACHE_NAME));
        assert_eq!(status.forced_activations, 0);
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::new(ScriptedNetwork::new())).await;

        let params = WorkerMessageParams { message: json!({ "type": "SKIP_WAITING" }) };
        let out: WorkerMessageOutput = output(&message_impl(&manager, params).await.unwrap());

        assert!(out.recognized);
        assert_eq!(out.status.forced_activations, 1);
    }

    #[tokio::test]
    async fn test_unknown_message_ignored() {
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::new(ScriptedNetwork::new())).await;

        let params = WorkerMessageParams { message: json!({ "type": "PING" }) };
        let out: WorkerMessageOutput = output(&message_impl(&manager, params).await.unwrap());

        assert!(!out.recognized);
        assert_eq!(out.status.forced_activations, 0);
    }
}

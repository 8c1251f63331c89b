//! Periodic check for a newly deployed app shell.
//!
//! The shell's entry bundle is fingerprinted (`assets/index.<hash>.js`). The
//! checker fetches `/index.html` with a cache-busting query, pulls the
//! fingerprint out of the markup and compares it with the one it saw first.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::fetch::Network;
use crate::worker::CacheManager;
use shellcache_core::message::SKIP_WAITING;
use shellcache_core::{CacheStorage, Error};

static BUNDLE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"assets/index\.(.+?)\.js").ok());

/// Fingerprint of the entry bundle referenced by an HTML document.
pub fn extract_bundle_hash(html: &str) -> Option<String> {
    BUNDLE_PATTERN
        .as_ref()?
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Result of one update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UpdateStatus {
    /// Fingerprint of the running shell.
    pub current: Option<String>,
    /// Fingerprint just served by the origin.
    pub latest: Option<String>,
    pub update_available: bool,
    /// RFC 3339 timestamp of the check.
    pub checked_at: String,
}

pub struct UpdateChecker<S, N> {
    manager: Arc<CacheManager<S, N>>,
    interval: Duration,
    auto_skip_waiting: bool,
    current: Mutex<Option<String>>,
}

impl<S, N> UpdateChecker<S, N>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    pub fn new(manager: Arc<CacheManager<S, N>>, interval: Duration, auto_skip_waiting: bool) -> Self {
        Self { manager, interval, auto_skip_waiting, current: Mutex::new(None) }
    }

    /// Compare against a known fingerprint instead of the first one seen.
    pub fn with_current(mut self, hash: impl Into<String>) -> Self {
        self.current = Mutex::new(Some(hash.into()));
        self
    }

    /// Fetch the shell once and compare fingerprints.
    ///
    /// # Errors
    ///
    /// Network errors, or `NETWORK_ERROR` when the shell answers a non-OK status.
    pub async fn check_once(&self) -> Result<UpdateStatus, Error> {
        let target = format!("/index.html?t={}", Utc::now().timestamp_millis());
        let request = self
            .manager
            .request(&target)?
            .with_header("Cache-Control", "no-cache")
            .with_header("Pragma", "no-cache");

        let outcome = self.manager.handle_fetch(request).await?;
        if !outcome.response.ok() {
            return Err(Error::Network(format!("update check answered status {}", outcome.response.status)));
        }

        let latest = extract_bundle_hash(&String::from_utf8_lossy(&outcome.response.body));

        let (current, update_available) = {
            let mut current = self.current.lock().await;
            if current.is_none() {
                current.clone_from(&latest);
            }
            let available = matches!((current.as_deref(), latest.as_deref()), (Some(c), Some(l)) if c != l);
            (current.clone(), available)
        };

        if update_available {
            tracing::info!(current = ?current, latest = ?latest, "new app shell available");
            if self.auto_skip_waiting {
                self.manager.on_message(&json!({ "type": SKIP_WAITING })).await?;
                *self.current.lock().await = latest.clone();
            }
        } else {
            tracing::debug!(current = ?current, "app shell up to date");
        }

        Ok(UpdateStatus { current, latest, update_available, checked_at: Utc::now().to_rfc3339() })
    }

    /// Check now and then every interval until the runtime shuts down.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.check_once().await {
                    tracing::warn!(error = %err, "update check failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedNetwork, TEST_ORIGIN};
    use crate::worker::{LifecycleState, WorkerConfig};
    use shellcache_core::MemoryStorage;
    use url::Url;

    const SEEDS: [&str; 2] = ["/", "/manifest.json"];

    fn shell(hash: &str) -> String {
        format!(
            r#"<!doctype html><html><head><script type="module" src="/assets/index.{hash}.js"></script></head></html>"#
        )
    }

    async fn manager(
        storage: Arc<MemoryStorage>, network: Arc<ScriptedNetwork>,
    ) -> Arc<CacheManager<MemoryStorage, ScriptedNetwork>> {
        for seed in SEEDS {
            network.respond(seed, 200, "seed");
        }
        let config = WorkerConfig {
            cache_name: "mytender-cache-v2".into(),
            origin: Url::parse(TEST_ORIGIN).unwrap(),
            seed_urls: SEEDS.iter().map(|s| s.to_string()).collect(),
            auto_activate: false,
        };
        let manager = Arc::new(CacheManager::new(config, storage, network));
        manager.install().await.unwrap();
        manager
    }

    #[test]
    fn test_extract_bundle_hash() {
        assert_eq!(extract_bundle_hash(&shell("B7x2kQ9a")).as_deref(), Some("B7x2kQ9a"));
        assert_eq!(extract_bundle_hash("<script src=\"/assets/vendor.abc.js\"></script>"), None);
        assert_eq!(extract_bundle_hash(""), None);
    }

    #[tokio::test]
    async fn test_first_check_records_baseline() {
        let network = Arc::new(ScriptedNetwork::new());
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::clone(&network)).await;
        network.respond("/index.html", 200, &shell("aaa111"));

        let checker = UpdateChecker::new(manager, Duration::from_secs(300), false);
        let status = checker.check_once().await.unwrap();

        assert_eq!(status.current.as_deref(), Some("aaa111"));
        assert_eq!(status.latest.as_deref(), Some("aaa111"));
        assert!(!status.update_available);
    }

    #[tokio::test]
    async fn test_new_fingerprint_reports_update() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(ScriptedNetwork::new());
        let manager = manager(Arc::clone(&storage), Arc::clone(&network)).await;
        network.respond("/index.html", 200, &shell("aaa111"));

        let checker = UpdateChecker::new(manager, Duration::from_secs(300), false);
        checker.check_once().await.unwrap();

        network.respond("/index.html", 200, &shell("bbb222"));
        let status = checker.check_once().await.unwrap();
        assert_eq!(status.current.as_deref(), Some("aaa111"));
        assert_eq!(status.latest.as_deref(), Some("bbb222"));
        assert!(status.update_available);

        assert_eq!(storage.puts(), 0);
    }

    #[tokio::test]
    async fn test_configured_fingerprint_used_as_baseline() {
        let network = Arc::new(ScriptedNetwork::new());
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::clone(&network)).await;
        network.respond("/index.html", 200, &shell("bbb222"));

        let checker = UpdateChecker::new(manager, Duration::from_secs(300), false).with_current("aaa111");
        assert!(checker.check_once().await.unwrap().update_available);
    }

    #[tokio::test]
    async fn test_auto_skip_waiting_activates_waiting_generation() {
        let storage = Arc::new(MemoryStorage::new());
        storage.open_store("mytender-cache-v1").await.unwrap();
        storage.set_active_generation("mytender-cache-v1").await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let manager = manager(Arc::clone(&storage), Arc::clone(&network)).await;
        assert_eq!(manager.state().await, LifecycleState::Waiting);
        network.respond("/index.html", 200, &shell("bbb222"));

        let checker = UpdateChecker::new(Arc::clone(&manager), Duration::from_secs(300), true).with_current("aaa111");
        let status = checker.check_once().await.unwrap();
        assert!(status.update_available);

        let worker = manager.status().await.unwrap();
        assert_eq!(worker.state, LifecycleState::Active);
        assert_eq!(worker.forced_activations, 1);
        assert_eq!(storage.store_names().await.unwrap(), vec!["mytender-cache-v2"]);

        assert!(!checker.check_once().await.unwrap().update_available);
    }

    #[tokio::test]
    async fn test_error_status_fails_check() {
        let network = Arc::new(ScriptedNetwork::new());
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::clone(&network)).await;
        network.respond("/index.html", 502, "bad gateway");

        let checker = UpdateChecker::new(manager, Duration::from_secs(300), false);
        let err = checker.check_once().await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_offline_check_fails() {
        let network = Arc::new(ScriptedNetwork::new());
        let manager = manager(Arc::new(MemoryStorage::new()), Arc::clone(&network)).await;
        network.set_offline(true);

        let checker = UpdateChecker::new(manager, Duration::from_secs(300), false);
        assert!(matches!(checker.check_once().await, Err(Error::Network(_))));
    }
}

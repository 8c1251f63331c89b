//! Offline asset cache manager.
//!
//! Answers each intercepted request from the cache, the network, or the
//! network with a cache fallback, and keeps stored content bounded to one
//! generation (store name) at a time.
//!
//! ### Lifecycle
//! - `install`: seed the generation's store with every seed URL, all or nothing.
//! - `activate`: delete every other store and record this one as active.
//! - `skip_waiting`: take over from a previous generation without waiting.
//!
//! ### Routing
//! - Network first: network, then the exact cached entry if the network rejects.
//! - Cache first: cached entry, else network; qualifying responses are written
//!   back in a detached task that never delays the caller.

mod lifecycle;

pub use lifecycle::{LifecycleState, WorkerStatus};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::try_join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{Network, resolve};
use lifecycle::Lifecycle;
use shellcache_core::{
    AppConfig, AssetResponse, CacheStorage, ControlMessage, Decision, Error, Request, RequestKey, ResponseType,
    Strategy, classify,
};

/// Static settings of one generation.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Store name, embedding the version tag.
    pub cache_name: String,
    pub origin: Url,
    /// Absolute paths seeded at install.
    pub seed_urls: Vec<String>,
    /// Take over right after install even when another generation is active.
    pub auto_activate: bool,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            cache_name: config.cache_name(),
            origin: config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?,
            seed_urls: config.seed_urls.clone(),
            auto_activate: config.auto_activate,
        })
    }
}

/// Where a returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Network rejected on a network-first route; served from the cache.
    CacheFallback,
}

/// Result of handling one intercepted request.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: AssetResponse,
    pub source: ResponseSource,
    pub decision: Decision,
}

/// The cache manager for one generation.
pub struct CacheManager<S, N> {
    config: WorkerConfig,
    storage: Arc<S>,
    network: Arc<N>,
    lifecycle: RwLock<Lifecycle>,
    forced_activations: AtomicU64,
}

impl<S, N> CacheManager<S, N>
where
    S: CacheStorage + 'static,
    N: Network,
{
    pub fn new(config: WorkerConfig, storage: Arc<S>, network: Arc<N>) -> Self {
        Self {
            config,
            storage,
            network,
            lifecycle: RwLock::new(Lifecycle::default()),
            forced_activations: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.read().await.state
    }

    /// Build a GET request for a path or absolute URL.
    pub fn request(&self, target: &str) -> Result<Request, Error> {
        let url = resolve(&self.config.origin, target).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Request::get(url))
    }

    /// Install this generation: seed its store, then activate if nothing
    /// else is holding on.
    ///
    /// # Errors
    ///
    /// `InstallFailed` if any seed fetch rejects or answers a non-OK status;
    /// nothing is written in that case and the state becomes `Redundant`.
    pub async fn install(&self) -> Result<(), Error> {
        {
            let mut lifecycle = self.lifecycle.write().await;
            if !lifecycle.state.can_install() {
                return Err(Error::InvalidInput(format!("cannot install while {}", lifecycle.state)));
            }
            lifecycle.state = LifecycleState::Installing;
        }

        tracing::info!(cache = %self.config.cache_name, seeds = self.config.seed_urls.len(), "installing generation");

        if let Err(err) = self.precache().await {
            self.lifecycle.write().await.state = LifecycleState::Redundant;
            let err = match err {
                Error::InstallFailed(_) => err,
                other => Error::InstallFailed(other.to_string()),
            };
            tracing::error!(cache = %self.config.cache_name, error = %err, "install failed");
            return Err(err);
        }

        let skip_requested = {
            let mut lifecycle = self.lifecycle.write().await;
            lifecycle.state = LifecycleState::Waiting;
            std::mem::take(&mut lifecycle.skip_requested)
        };

        let previous = self.storage.active_generation().await?;
        let unopposed = previous.as_deref().is_none_or(|p| p == self.config.cache_name);

        if skip_requested || self.config.auto_activate || unopposed {
            self.activate().await
        } else {
            tracing::info!(
                cache = %self.config.cache_name,
                previous = ?previous,
                "installed; waiting for previous generation to release"
            );
            Ok(())
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let store = &self.config.cache_name;
        self.storage.open_store(store).await?;

        let requests = self
            .config
            .seed_urls
            .iter()
            .map(|seed| self.request(seed))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(requests.iter().map(|r| self.network.fetch(r))).await?;

        let mut entries = Vec::with_capacity(requests.len());
        for (request, response) in requests.iter().zip(responses) {
            if !response.ok() {
                return Err(Error::InstallFailed(format!("{} answered status {}", request.url, response.status)));
            }
            entries.push((request.key(), response));
        }

        let count = entries.len();
        self.storage.put_all(store, entries).await?;
        tracing::debug!(cache = %store, count, "seeded generation");
        Ok(count)
    }

    /// Make this generation the only one: delete every other store and
    /// record this one as active.
    ///
    /// # Errors
    ///
    /// `NotInstalled` unless the generation is waiting or already active.
    pub async fn activate(&self) -> Result<(), Error> {
        let state = self.state().await;
        if !matches!(state, LifecycleState::Waiting | LifecycleState::Active) {
            return Err(Error::NotInstalled(format!("cannot activate while {state}")));
        }

        let current = &self.config.cache_name;
        for store in self.storage.store_names().await? {
            if store != *current && self.storage.delete_store(&store).await? {
                tracing::info!(store = %store, "deleted stale generation");
            }
        }

        self.storage.set_active_generation(current).await?;
        self.lifecycle.write().await.state = LifecycleState::Active;
        tracing::info!(cache = %current, "generation active");
        Ok(())
    }

    /// Forced activation. Activates now when waiting, right after install
    /// when installing, and does nothing otherwise.
    pub async fn skip_waiting(&self) -> Result<(), Error> {
        self.forced_activations.fetch_add(1, Ordering::SeqCst);

        let state = {
            let mut lifecycle = self.lifecycle.write().await;
            if lifecycle.state == LifecycleState::Installing {
                lifecycle.skip_requested = true;
            }
            lifecycle.state
        };

        match state {
            LifecycleState::Waiting => self.activate().await,
            _ => Ok(()),
        }
    }

    /// Handle a control message. Returns whether it was recognized.
    pub async fn on_message(&self, payload: &Value) -> Result<bool, Error> {
        match ControlMessage::parse(payload) {
            Some(ControlMessage::SkipWaiting) => {
                tracing::info!(cache = %self.config.cache_name, "skip waiting requested");
                self.skip_waiting().await?;
                Ok(true)
            }
            None => {
                tracing::debug!(%payload, "ignoring unrecognized message");
                Ok(false)
            }
        }
    }

    /// Store that reads and writes go to: this generation once active,
    /// otherwise whichever generation last activated.
    pub async fn serving_generation(&self) -> Result<Option<String>, Error> {
        if self.state().await == LifecycleState::Active {
            return Ok(Some(self.config.cache_name.clone()));
        }
        self.storage.active_generation().await
    }

    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        Ok(WorkerStatus {
            cache_name: self.config.cache_name.clone(),
            state: self.state().await,
            active_generation: self.storage.active_generation().await?,
            forced_activations: self.forced_activations.load(Ordering::SeqCst),
        })
    }

    /// Answer one intercepted request.
    ///
    /// # Errors
    ///
    /// Network errors surface when nothing in the cache can stand in for
    /// the response.
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        let decision = classify(&request);

        let Some(store) = self.serving_generation().await? else {
            tracing::debug!(url = %request.url, "no active generation; passing through");
            let response = self.network.fetch(&request).await?;
            return Ok(FetchOutcome { response, source: ResponseSource::Network, decision });
        };

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            strategy = decision.strategy.as_str(),
            cacheable = decision.cacheable,
            "routing request"
        );

        match decision.strategy {
            Strategy::NetworkFirst => self.network_first(&store, &request, decision).await,
            Strategy::CacheFirst => self.cache_first(store, request, decision).await,
        }
    }

    async fn network_first(&self, store: &str, request: &Request, decision: Decision) -> Result<FetchOutcome, Error> {
        let err = match self.network.fetch(request).await {
            Ok(response) => return Ok(FetchOutcome { response, source: ResponseSource::Network, decision }),
            Err(err) if err.is_network() => err,
            Err(err) => return Err(err),
        };

        match self.storage.get(store, &request.key()).await {
            Ok(Some(entry)) => {
                tracing::debug!(url = %request.url, error = %err, "network failed; serving cached copy");
                Ok(FetchOutcome { response: entry.response, source: ResponseSource::CacheFallback, decision })
            }
            Ok(None) => Err(err),
            Err(lookup) => {
                tracing::warn!(url = %request.url, error = %lookup, "cache lookup failed during fallback");
                Err(err)
            }
        }
    }

    async fn cache_first(&self, store: String, request: Request, decision: Decision) -> Result<FetchOutcome, Error> {
        let key = request.key();

        if request.is_get()
            && let Some(entry) = self.storage.get(&store, &key).await?
        {
            return Ok(FetchOutcome { response: entry.response, source: ResponseSource::Cache, decision });
        }

        let response = self.network.fetch(&request).await?;

        if decision.cacheable && response.status == 200 && response.response_type == ResponseType::Basic {
            self.spawn_put(store, key, response.clone());
        }

        Ok(FetchOutcome { response, source: ResponseSource::Network, decision })
    }

    /// Write a response into the cache without making the caller wait.
    /// Failures are logged and dropped, as are writes whose store was
    /// deleted by an activation in the meantime.
    fn spawn_put(&self, store: String, key: RequestKey, response: AssetResponse) {
        let storage = Arc::clone(&self.storage);
        tokio::spawn(async move {
            match storage.put(&store, &key, &response).await {
                Ok(true) => tracing::debug!(store = %store, %key, "cached response"),
                Ok(false) => tracing::debug!(store = %store, %key, "store retired; dropping cache write"),
                Err(err) => tracing::warn!(store = %store, %key, error = %err, "dropping cache write"),
            }
        });
    }
}

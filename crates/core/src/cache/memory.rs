//! In-memory implementation of [`CacheStorage`].
//!
//! Test backend for the cache manager and the server tools. Nothing survives
//! the process. It counts single-entry writes so tests can wait for detached
//! cache writes to land.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use super::key::RequestKey;
use super::storage::{CacheStorage, CachedEntry};
use crate::Error;
use crate::request::AssetResponse;

type Store = HashMap<String, CachedEntry>;

/// Process-local cache storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<BTreeMap<String, Store>>,
    active: RwLock<Option<String>>,
    puts: AtomicUsize,
    written: Notify,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed [`CacheStorage::put`] calls, including writes
    /// dropped because the store was gone.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` [`CacheStorage::put`] calls have completed.
    pub async fn wait_for_puts(&self, count: usize) {
        loop {
            let written = self.written.notified();
            if self.puts() >= count {
                return;
            }
            written.await;
        }
    }

    fn entry(key: &RequestKey, response: &AssetResponse) -> CachedEntry {
        CachedEntry { key: key.clone(), response: response.clone(), stored_at: chrono::Utc::now().to_rfc3339() }
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open_store(&self, store: &str) -> Result<(), Error> {
        self.stores.write().await.entry(store.to_string()).or_default();
        Ok(())
    }

    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        let stores = self.stores.read().await;
        Ok(stores.get(store).and_then(|s| s.get(&key.hash())).cloned())
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &AssetResponse) -> Result<bool, Error> {
        let written = match self.stores.write().await.get_mut(store) {
            Some(target) => {
                target.insert(key.hash(), Self::entry(key, response));
                true
            }
            None => false,
        };
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.written.notify_waiters();
        Ok(written)
    }

    async fn put_all(&self, store: &str, entries: Vec<(RequestKey, AssetResponse)>) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        let target = stores.entry(store.to_string()).or_default();
        for (key, response) in &entries {
            target.insert(key.hash(), Self::entry(key, response));
        }
        Ok(())
    }

    async fn delete_store(&self, store: &str) -> Result<bool, Error> {
        Ok(self.stores.write().await.remove(store).is_some())
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }

    async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        Ok(self.stores.read().await.get(store).map_or(0, |s| s.len() as u64))
    }

    async fn entries(&self, store: &str) -> Result<Vec<CachedEntry>, Error> {
        let stores = self.stores.read().await;
        let mut entries: Vec<CachedEntry> =
            stores.get(store).map(|s| s.values().cloned().collect()).unwrap_or_default();
        entries.sort_by(|a, b| a.key.url.cmp(&b.key.url));
        Ok(entries)
    }

    async fn active_generation(&self) -> Result<Option<String>, Error> {
        Ok(self.active.read().await.clone())
    }

    async fn set_active_generation(&self, store: &str) -> Result<(), Error> {
        *self.active.write().await = Some(store.to_string());
        Ok(())
    }
}

//! Storage interface shared by the SQLite and in-memory backends.

use async_trait::async_trait;

use super::key::RequestKey;
use crate::Error;
use crate::request::AssetResponse;

/// Key under which the active generation's store name is recorded.
pub const ACTIVE_GENERATION: &str = "active_generation";

/// A stored response with its identity and write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub key: RequestKey,
    pub response: AssetResponse,
    /// RFC 3339 timestamp of the write.
    pub stored_at: String,
}

/// Named, generation-scoped response stores.
///
/// Writes are blind overwrites keyed by request identity; the backend is
/// responsible for serializing concurrent writers. Only `open_store` and
/// `put_all` create stores. A single `put` into a store that no longer exists
/// writes nothing, so a write racing an activation cannot bring a deleted
/// generation back.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if it does not exist yet.
    async fn open_store(&self, store: &str) -> Result<(), Error>;

    /// Exact-identity lookup.
    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error>;

    /// Store one response, replacing any previous entry for the key.
    /// Returns `false` without writing when the store does not exist.
    async fn put(&self, store: &str, key: &RequestKey, response: &AssetResponse) -> Result<bool, Error>;

    /// Store several responses atomically: either all are written or none.
    /// Creates the store if needed.
    async fn put_all(&self, store: &str, entries: Vec<(RequestKey, AssetResponse)>) -> Result<(), Error>;

    /// Delete a store and every entry in it. Returns whether it existed.
    async fn delete_store(&self, store: &str) -> Result<bool, Error>;

    /// Names of all existing stores, sorted.
    async fn store_names(&self) -> Result<Vec<String>, Error>;

    /// Number of entries in a store (0 when it does not exist).
    async fn entry_count(&self, store: &str) -> Result<u64, Error>;

    /// All entries of a store, ordered by URL.
    async fn entries(&self, store: &str) -> Result<Vec<CachedEntry>, Error>;

    /// Store name of the generation that last activated, if any.
    async fn active_generation(&self) -> Result<Option<String>, Error>;

    /// Record the generation that just activated.
    async fn set_active_generation(&self, store: &str) -> Result<(), Error>;
}

//! Generation-scoped response cache.
//!
//! A cache is a set of named stores, one per generation. Each store maps a
//! request identity (method + URL) to a stored response. Stores are only ever
//! removed whole; there is no per-entry expiry or eviction.
//!
//! Two backends implement [`CacheStorage`]:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, schema migrations
//! - [`MemoryStorage`]: process-local maps for tests

pub mod connection;
pub mod hash;
pub mod key;
pub mod memory;
pub mod migrations;
pub mod storage;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::RequestKey;
pub use memory::MemoryStorage;
pub use storage::{CacheStorage, CachedEntry};

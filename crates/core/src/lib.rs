//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Generation-scoped cache storage with SQLite and in-memory backends
//! - Request/response model and request classification
//! - Control message parsing
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;
pub mod policy;
pub mod request;

pub use cache::{CacheDb, CacheStorage, CachedEntry, MemoryStorage, RequestKey};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use message::ControlMessage;
pub use policy::{Decision, Strategy, classify};
pub use request::{AssetResponse, Request, RequestCacheMode, ResponseType};

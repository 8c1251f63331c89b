//! Client code for shellcache.
//!
//! This crate provides the HTTP fetch adapter, the generation-scoped cache
//! manager, and the update checker used by the server.

pub mod fetch;
pub mod update;
pub mod worker;

#[cfg(any(test, feature = "test"))]
pub mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use update::{UpdateChecker, UpdateStatus};
pub use worker::{CacheManager, FetchOutcome, LifecycleState, ResponseSource, WorkerConfig, WorkerStatus};

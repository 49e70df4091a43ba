/// Offline cache module
///
/// This module handles:
/// - The versioned asset manifest (manifest.rs)
/// - Named response caches persisted in SQLite (cache_store.rs)
/// - The install / activate / fetch lifecycle (worker.rs)

pub mod cache_store;
pub mod manifest;
pub mod worker;

pub use cache_store::SqliteCacheStorage;
pub use manifest::CacheManifest;
pub use worker::OfflineCacheWorker;

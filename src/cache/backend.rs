//! Cache Backend Module
//!
//! The capability every cache backend provides to the proxy, and the
//! in-process implementation built on [`CacheStore`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheStats, CacheStore};
use crate::error::CacheError;
use crate::models::ResponseSnapshot;

// == Response Cache Trait ==
/// Response cache used by the proxy handler.
///
/// Implementations must be safe to share across concurrently running
/// handlers. A failing backend returns [`CacheError`]; the proxy treats such
/// failures as a miss.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Returns the live response for `key`, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<ResponseSnapshot>, CacheError>;

    /// Stores `response` under `key` for `ttl`.
    async fn set(&self, key: &str, response: ResponseSnapshot, ttl: Duration)
        -> Result<(), CacheError>;

    /// Invalidates one key. Returns whether it was present.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes every entry. Returns the number removed.
    async fn clear(&self) -> Result<usize, CacheError>;

    async fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Short backend name for logs and stats.
    fn name(&self) -> &'static str;

    /// Maximum number of live entries, when the backend enforces one.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

// == Memory Cache ==
/// In-process backend: a [`CacheStore`] shared behind `Arc<RwLock<_>>`.
///
/// Lookups take the write lock because a hit reorders the LRU list.
#[derive(Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<CacheStore>>,
    capacity: usize,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self::from_store(CacheStore::new(capacity))
    }

    pub fn from_store(store: CacheStore) -> Self {
        Self {
            capacity: store.capacity(),
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.store)
    }

    /// Sweeps expired entries. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<ResponseSnapshot>, CacheError> {
        let mut store = self.store.write().await;
        Ok(store.get(key).map(|entry| {
            debug!(
                "Cache HIT {} ({} bytes, {}ms left)",
                key,
                entry.body_len(),
                entry.ttl_remaining_ms()
            );
            entry.response
        }))
    }

    async fn set(
        &self,
        key: &str,
        response: ResponseSnapshot,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        store.set(key.to_string(), response, ttl)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.store.write().await.delete(key))
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        Ok(self.store.write().await.clear())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(self.store.read().await.stats())
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }
}

//! Cache Store Module
//!
//! Bounded response cache combining HashMap storage with LRU tracking and TTL
//! expiration. Pure data structure: no locking, no I/O.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, LruTracker, MAX_BODY_SIZE, MAX_KEY_LENGTH};
use crate::error::CacheError;
use crate::models::ResponseSnapshot;

// == Cache Store ==
/// Response storage with LRU eviction and per-entry expiry.
#[derive(Debug)]
pub struct CacheStore {
    /// Key -> entry storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker, holds exactly the keys of `entries`
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of live entries
    capacity: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(4096)),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity,
        }
    }

    // == Set ==
    /// Stores a response under `key`, expiring `ttl` from now.
    ///
    /// If the key already exists, the entry is replaced and TTL is reset.
    /// If the cache is at capacity, the least recently used entry is evicted.
    pub fn set(
        &mut self,
        key: String,
        response: ResponseSnapshot,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_at(key, response, ttl, current_timestamp_ms())
    }

    /// [`set`](Self::set) against an explicit clock reading.
    pub fn set_at(
        &mut self,
        key: String,
        response: ResponseSnapshot,
        ttl: Duration,
        now_ms: u64,
    ) -> Result<(), CacheError> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidEntry(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if response.body.len() > MAX_BODY_SIZE {
            return Err(CacheError::InvalidEntry(format!(
                "Body exceeds maximum size of {} bytes",
                MAX_BODY_SIZE
            )));
        }

        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.capacity {
            match self.lru.evict_oldest() {
                Some(evicted_key) => {
                    self.entries.remove(&evicted_key);
                    self.stats.record_eviction();
                }
                None => {
                    return Err(CacheError::CacheFull(
                        "Cache is full and eviction failed".to_string(),
                    ));
                }
            }
        }

        let entry = CacheEntry::new(key.clone(), response, ttl, now_ms);
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);

        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Get ==
    /// Looks up a live entry by key.
    ///
    /// A hit promotes the key to most recently used. An expired entry is
    /// removed, counted as a miss and an expiration (not an eviction).
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, current_timestamp_ms())
    }

    /// [`get`](Self::get) against an explicit clock reading.
    pub fn get_at(&mut self, key: &str, now_ms: u64) -> Option<CacheEntry> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now_ms),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_miss();
            self.stats.record_expirations(1);
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).cloned()
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Removes every entry. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(current_timestamp_ms())
    }

    pub fn cleanup_expired_at(&mut self, now_ms: u64) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether an entry is held for `key`, live or not. Does not touch LRU order.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lru.iter().map(str::to_string).collect()
    }

    // == Invariants ==
    /// Checks the capacity bound and that the recency list and the entry map
    /// hold exactly the same keys.
    pub fn is_consistent(&self) -> bool {
        if self.entries.len() > self.capacity || self.lru.len() != self.entries.len() {
            return false;
        }
        let mut walked = 0;
        for key in self.lru.iter() {
            if !self.entries.contains_key(key) {
                return false;
            }
            walked += 1;
        }
        walked == self.entries.len()
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }
}

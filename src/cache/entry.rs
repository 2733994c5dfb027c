//! Cache Entry Module
//!
//! Defines the structure for individual cached responses with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::models::ResponseSnapshot;

// == Cache Entry ==
/// A cached origin response with its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Canonical cache key
    pub key: String,
    /// Stored response
    pub response: ResponseSnapshot,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` after `now_ms`.
    pub fn new(key: String, response: ResponseSnapshot, ttl: Duration, now_ms: u64) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            key,
            response,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    /// Size of the stored body in bytes.
    pub fn body_len(&self) -> usize {
        self.response.body.len()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

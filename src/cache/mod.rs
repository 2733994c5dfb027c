//! Cache Module
//!
//! Bounded response caching with TTL expiration and LRU eviction, plus the
//! backend capability the proxy talks to.

mod backend;
mod entry;
mod lru;
mod remote;
mod stats;
mod store;


// Re-export public types
pub use backend::{MemoryCache, ResponseCache};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use remote::{RedisCache, RedisSettings};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 8 * 1024;

/// Maximum cacheable response body size in bytes
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10 MB

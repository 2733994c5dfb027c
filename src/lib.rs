//! Cache Proxy - A caching HTTP reverse proxy
//!
//! Forwards requests to a single origin server and serves repeated GETs from
//! a bounded response cache with TTL expiration and LRU eviction.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod origin;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;

//! API Module
//!
//! The proxy handler and the administrative endpoints.
//!
//! # Endpoints
//! - `GET /_proxy/health` - Health check endpoint
//! - `GET /_proxy/stats` - Cache statistics
//! - `DELETE /_proxy/cache` - Clear the cache
//! - `DELETE /_proxy/cache/entry?key=...` - Invalidate one cached response
//! - anything else - proxied to the origin, through the cache for GET

pub mod admin;
pub mod proxy;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use proxy::{cache_key, proxy_handler};
pub use routes::{create_router, ADMIN_PREFIX};
pub use state::{AppState, ProxySettings};

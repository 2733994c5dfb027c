//! Application State
//!
//! Everything a handler needs, built once at startup and shared by reference.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{MemoryCache, RedisCache, RedisSettings, ResponseCache};
use crate::config::{Backend, Config};
use crate::error::ConfigError;
use crate::origin::{HttpOriginClient, OriginClient};

/// Proxy behaviour fixed at startup.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Origin base URL without trailing slash
    pub origin_base: String,
    /// Lifetime given to every cached response
    pub default_ttl: Duration,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Response cache (in-memory or remote)
    pub cache: Arc<dyn ResponseCache>,
    /// Outbound client for the origin server
    pub origin: Arc<dyn OriginClient>,
    pub settings: Arc<ProxySettings>,
    /// Set when the in-memory backend is active, for the expiry sweep
    pub memory: Option<MemoryCache>,
}

impl AppState {
    /// Creates a new AppState from already-built parts.
    pub fn new(
        cache: Arc<dyn ResponseCache>,
        origin: Arc<dyn OriginClient>,
        settings: ProxySettings,
    ) -> Self {
        Self {
            cache,
            origin,
            settings: Arc::new(settings),
            memory: None,
        }
    }

    /// Creates an AppState backed by an in-memory cache.
    pub fn with_memory_cache(
        cache: MemoryCache,
        origin: Arc<dyn OriginClient>,
        settings: ProxySettings,
    ) -> Self {
        let mut state = Self::new(Arc::new(cache.clone()), origin, settings);
        state.memory = Some(cache);
        state
    }

    /// Validates the configuration and builds every collaborator.
    ///
    /// With the redis backend this connects and PINGs the server, returning
    /// [`ConfigError::BackendUnreachable`] if it does not answer. The caller
    /// decides whether to exit, retry or fall back to memory.
    pub async fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let origin_base = config.validate()?;
        let origin: Arc<dyn OriginClient> =
            Arc::new(HttpOriginClient::new(config.fetch_timeout())?);
        let settings = ProxySettings {
            origin_base,
            default_ttl: config.ttl(),
        };

        let state = match config.backend {
            Backend::Memory => {
                let cache = MemoryCache::new(config.cache_capacity);
                Self::with_memory_cache(cache, origin, settings)
            }
            Backend::Redis => {
                let redis = RedisCache::connect(RedisSettings {
                    url: config.redis_url.clone().unwrap_or_default(),
                    prefix: config.redis_prefix.clone(),
                    timeout: config.redis_timeout(),
                })
                .await?;
                Self::new(Arc::new(redis), origin, settings)
            }
        };

        info!(
            "Proxy state ready: backend={}, origin={}",
            config.backend.name(),
            state.settings.origin_base
        );
        Ok(state)
    }
}

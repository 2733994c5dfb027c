//! Configuration Module
//!
//! Handles loading and validating proxy configuration from command-line flags
//! and environment variables.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::ConfigError;

/// Cache store implementation selected at startup.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Bounded in-process LRU + TTL store
    #[default]
    Memory,
    /// External redis server
    Redis,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Redis => "redis",
        }
    }
}

/// Proxy configuration parameters.
///
/// Every value can be given as a flag or through an environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "cache_proxy", version, about = "Caching reverse proxy")]
pub struct Config {
    /// Port the proxy listens on
    #[arg(long, default_value_t = 8080, env = "PORT")]
    pub port: u16,

    /// Base URL of the origin server
    #[arg(long, env = "ORIGIN")]
    pub origin: Option<String>,

    /// Maximum number of cached responses
    #[arg(long, default_value_t = 100, env = "CACHE_CAPACITY")]
    pub cache_capacity: usize,

    /// Default cache entry lifetime in seconds
    #[arg(long, default_value_t = 300, env = "CACHE_TTL")]
    pub cache_ttl: u64,

    /// Per-request origin timeout in seconds
    #[arg(long, default_value_t = 10, env = "FETCH_TIMEOUT")]
    pub fetch_timeout: u64,

    /// Cache backend
    #[arg(long, value_enum, default_value_t = Backend::Memory, env = "CACHE_BACKEND")]
    pub backend: Backend,

    /// Redis connection URL, e.g. redis://default@localhost:6379
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Prefix applied to every redis key
    #[arg(long, default_value = "cache_proxy:", env = "REDIS_PREFIX")]
    pub redis_prefix: String,

    /// Timeout for a single redis operation in milliseconds
    #[arg(long, default_value_t = 2000, env = "REDIS_TIMEOUT_MS")]
    pub redis_timeout_ms: u64,

    /// Background expiry sweep interval in seconds (0 disables it)
    #[arg(long, default_value_t = 1, env = "CLEANUP_INTERVAL")]
    pub cleanup_interval: u64,
}

impl Config {
    /// Checks the configuration before anything is built from it.
    ///
    /// Returns the normalized origin base URL (without trailing slash).
    pub fn validate(&self) -> Result<String, ConfigError> {
        let origin = self
            .origin
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .ok_or(ConfigError::MissingOrigin)?;

        let url = reqwest::Url::parse(origin)
            .map_err(|e| ConfigError::InvalidOrigin(origin.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::InvalidOrigin(
                origin.to_string(),
                "expected an absolute http(s) URL".to_string(),
            ));
        }

        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "cache-capacity",
                "must be at least 1".to_string(),
            ));
        }
        if self.cache_ttl == 0 {
            return Err(ConfigError::InvalidValue(
                "cache-ttl",
                "must be at least 1 second".to_string(),
            ));
        }
        if self.fetch_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "fetch-timeout",
                "must be at least 1 second".to_string(),
            ));
        }
        let has_redis_url = self
            .redis_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty());
        if self.backend == Backend::Redis && !has_redis_url {
            return Err(ConfigError::MissingRedisUrl);
        }

        Ok(origin.trim_end_matches('/').to_string())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            origin: None,
            cache_capacity: 100,
            cache_ttl: 300,
            fetch_timeout: 10,
            backend: Backend::Memory,
            redis_url: None,
            redis_prefix: "cache_proxy:".to_string(),
            redis_timeout_ms: 2000,
            cleanup_interval: 1,
        }
    }
}

//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Configuration Error ==
/// Startup errors. The proxy must not begin serving when one of these is returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No origin URL was given
    #[error("origin URL is required (--origin or ORIGIN)")]
    MissingOrigin,

    /// Origin URL could not be parsed or is not http(s)
    #[error("invalid origin URL '{0}': {1}")]
    InvalidOrigin(String, String),

    /// A numeric option is out of range
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    /// The redis backend was selected without a connection URL
    #[error("redis backend requires --redis-url or REDIS_URL")]
    MissingRedisUrl,

    /// The selected cache backend did not answer at startup
    #[error("cache backend '{backend}' is unreachable: {reason}")]
    BackendUnreachable {
        backend: &'static str,
        reason: String,
    },

    /// The outbound HTTP client could not be built
    #[error("failed to build origin client: {0}")]
    HttpClient(String),
}

// == Origin Error ==
/// Failures while talking to the origin server.
#[derive(Error, Debug)]
pub enum OriginError {
    /// Origin unreachable, connection refused or malformed response
    #[error("origin transport error: {0}")]
    Transport(String),

    /// No response within the configured fetch timeout
    #[error("origin timed out after {0:?}")]
    Timeout(Duration),

    /// The response head arrived but the body could not be read in full
    #[error("failed to read origin response body: {0}")]
    Read(String),
}

// == Cache Error ==
/// Failures of a cache backend.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Entry rejected by the store (key or body too large)
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// Cache is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Remote backend failure (connection, command, timeout)
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Stored entry could not be encoded or decoded
    #[error("Cache codec error: {0}")]
    Codec(String),
}

// == Proxy Error ==
/// Errors surfaced to clients of the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error(transparent)]
    Upstream(#[from] OriginError),

    /// Invalid inbound request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache backend failure on an administrative operation
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Key not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),
}

impl ProxyError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(OriginError::Read(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Short diagnostic shown to the client.
    fn public_message(&self) -> String {
        match self {
            ProxyError::Upstream(OriginError::Read(_)) => {
                "Error reading response from origin server".to_string()
            }
            ProxyError::Upstream(OriginError::Timeout(_)) => {
                "Origin server timed out".to_string()
            }
            ProxyError::Upstream(OriginError::Transport(_)) => {
                "Error contacting origin server".to_string()
            }
            ProxyError::Cache(_) => "Cache backend unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.public_message()));

        (self.status(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for proxy handlers.
pub type Result<T> = std::result::Result<T, ProxyError>;

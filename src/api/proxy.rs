//! Proxy Handler
//!
//! Handles one inbound request: derive the cache key, try the cache, on a
//! miss forward to the origin, store the response and relay it.

use axum::{
    body,
    extract::{Request, State},
    http::{Method, Uri},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use super::AppState;
use crate::error::{ProxyError, Result};
use crate::origin::OriginRequest;

/// Largest inbound request body forwarded to the origin
pub const MAX_REQUEST_BODY: usize = 10 * 1024 * 1024;

/// Path plus `?query` of the inbound request.
fn request_target(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

/// Cache key for a request, or `None` when the request bypasses the cache.
///
/// Only GET is cached. The key is the path plus the query string, so
/// `/items?page=1` and `/items?page=2` are cached separately.
pub fn cache_key(method: &Method, uri: &Uri) -> Option<String> {
    (*method == Method::GET).then(|| request_target(uri).to_string())
}

/// Fallback handler proxying every non-admin request.
///
/// Cache backend failures degrade to a miss. Origin failures are never
/// cached. If the client goes away, axum drops this future and the
/// in-flight origin fetch with it.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let (parts, inbound_body) = request.into_parts();
    let target = request_target(&parts.uri).to_string();
    let key = cache_key(&parts.method, &parts.uri);

    if let Some(key) = &key {
        match state.cache.get(key).await {
            Ok(Some(cached)) => {
                info!("served-from-cache {} -> {}", key, cached.status);
                return Ok(cached.into_response());
            }
            Ok(None) => debug!("Cache MISS {}", key),
            Err(e) => warn!("Cache lookup for {} failed, treating as miss: {}", key, e),
        }
    }

    let body = body::to_bytes(inbound_body, MAX_REQUEST_BODY)
        .await
        .map_err(|e| ProxyError::InvalidRequest(format!("failed to read request body: {}", e)))?;

    let outbound = OriginRequest {
        method: parts.method.clone(),
        url: format!("{}{}", state.settings.origin_base, target),
        headers: parts.headers,
        body,
    };

    let response = match state.origin.fetch(outbound).await {
        Ok(response) => response,
        Err(e) => {
            warn!("upstream-failed {} {}: {}", parts.method, target, e);
            return Err(e.into());
        }
    };

    if let Some(key) = &key {
        if let Err(e) = state
            .cache
            .set(key, response.clone(), state.settings.default_ttl)
            .await
        {
            warn!("Not caching {}: {}", key, e);
        }
    }

    info!(
        "served-from-origin {} {} -> {}",
        parts.method, target, response.status
    );
    Ok(response.into_response())
}

//! Admin Handlers
//!
//! Cache inspection and invalidation endpoints under `/_proxy`.

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use super::AppState;
use crate::error::{ProxyError, Result};
use crate::models::{
    ClearResponse, HealthResponse, InvalidateParams, InvalidateResponse, StatsResponse,
};

/// Handler for GET /_proxy/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.settings.origin_base.as_str()))
}

/// Handler for GET /_proxy/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.cache.stats().await?;

    Ok(Json(StatsResponse::new(
        state.cache.name(),
        &stats,
        state.cache.capacity(),
    )))
}

/// Handler for DELETE /_proxy/cache
///
/// Drops every cached response.
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.cache.clear().await?;
    info!("Cache cleared: {} entries removed", removed);

    Ok(Json(ClearResponse::new(removed)))
}

/// Handler for DELETE /_proxy/cache/entry?key=...
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(params): Query<InvalidateParams>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = params.validate() {
        return Err(ProxyError::InvalidRequest(error_msg));
    }

    if !state.cache.delete(&params.key).await? {
        return Err(ProxyError::NotFound(params.key));
    }
    info!("Cache entry invalidated: {}", params.key);

    Ok(Json(InvalidateResponse::new(params.key)))
}

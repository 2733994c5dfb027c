//! API Routes
//!
//! Configures the Axum router: admin endpoints under [`ADMIN_PREFIX`], every
//! other path proxied to the origin.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::admin::{clear_handler, health_handler, invalidate_handler, stats_handler};
use super::proxy::proxy_handler;
use super::AppState;

/// Path prefix reserved for the proxy's own endpoints. Origin paths under
/// it are not reachable through the proxy.
pub const ADMIN_PREFIX: &str = "/_proxy";

/// Creates the main router.
///
/// # Middleware
/// - CORS: admin endpoints only, so proxied responses carry exactly the
///   origin's headers
/// - Tracing: logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_handler))
        .route("/cache/entry", delete(invalidate_handler))
        .layer(cors);

    Router::new()
        .nest(ADMIN_PREFIX, admin)
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

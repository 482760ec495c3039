//! API Routes
//!
//! Configures the Axum router for the caching gateway.

use axum::{
    routing::{any, delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, invalidate_all_handler, invalidate_handler, proxy_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `ANY /api/*path` - Storefront API, GETs served through the cache
/// - `GET /_cache/stats` - Cache statistics
/// - `POST /_cache/invalidate` - Drop entries whose key matches a pattern
/// - `DELETE /_cache` - Drop every entry
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/*path", any(proxy_handler))
        .route("/_cache/stats", get(stats_handler))
        .route("/_cache/invalidate", post(invalidate_handler))
        .route("/_cache", delete(invalidate_all_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

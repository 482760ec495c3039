//! API Module
//!
//! HTTP handlers and routing for the caching gateway.
//!
//! # Endpoints
//! - `ANY /api/*path` - Storefront API through the cache
//! - `GET /_cache/stats` - Cache statistics
//! - `POST /_cache/invalidate` - Pattern invalidation
//! - `DELETE /_cache` - Clear the cache
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! API Handlers
//!
//! HTTP request handlers for the gateway: the cached proxy route and the
//! cache administration endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{scope_for_credential, ApiCache, RequestOptions, TtlTable};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{CachedClient, ReqwestTransport, Transport};
use crate::models::{HealthResponse, InvalidateRequest, InvalidateResponse, StatsResponse};

/// Header asking the gateway to bypass fresh entries and refetch.
pub const REFRESH_HEADER: &str = "x-cache-refresh";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: CachedClient<Value>,
}

impl AppState {
    pub fn new(client: CachedClient<Value>) -> Self {
        Self { client }
    }

    /// Builds the cache and upstream transport from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = ApiCache::new()
            .with_ttl_table(TtlTable::storefront_with_default(config.default_ttl()))
            .with_stale_after(config.pending_stale_after());
        let transport: Arc<dyn Transport> = Arc::new(
            ReqwestTransport::new(config.request_timeout())?.with_base_url(&config.upstream_url),
        );
        Ok(Self::new(CachedClient::new(cache, transport)))
    }

    pub fn cache(&self) -> &ApiCache<Value> {
        self.client.cache()
    }
}

/// Handler for ANY /api/*path
///
/// Forwards the call upstream through `cached_fetch`. GET responses are
/// cached per caller credential; successful mutations invalidate cached
/// reads of the same resource.
///
/// The upstream URL is the request path exactly as received. Percent
/// escapes such as `%3F` or `%2F` stay encoded.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>> {
    let path = uri.path();
    let mut url = path.to_string();
    if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }

    let mut options = RequestOptions::new().with_method(method.as_str());
    if !body.is_empty() {
        options = options.with_body(body);
    }
    if let Some(auth) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        options = options
            .with_header("authorization", auth)
            .with_scope(scope_for_credential(auth));
    }

    let force_refresh = headers
        .get(REFRESH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == "1" || v.eq_ignore_ascii_case("true"));

    let is_mutation = !options.is_get();
    let data = state.client.cached_fetch(&url, options, force_refresh).await?;

    if is_mutation {
        let resource = path
            .strip_prefix("/api/")
            .and_then(|rest| rest.split('/').find(|s| !s.is_empty()));
        if let Some(resource) = resource {
            let removed = state.cache().invalidate(format!("/api/{}", resource));
            info!("{} {} invalidated {} cached entries", method, path, removed);
        }
    }

    Ok(Json(data))
}

/// Handler for GET /_cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache().stats().into())
}

/// Handler for POST /_cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    let pattern = req.into_pattern()?;
    let removed = state.cache().invalidate(pattern);
    Ok(Json(InvalidateResponse::new(removed)))
}

/// Handler for DELETE /_cache
pub async fn invalidate_all_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    Json(InvalidateResponse::new(state.cache().invalidate_all()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

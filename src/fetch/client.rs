//! Cached Client
//!
//! `cached_fetch` composes the cache, the in-flight request map and the
//! transport. GET requests are served from cache, joined onto an identical
//! request already in flight, or fetched once and cached. Every other method
//! goes straight to the transport.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::{ApiCache, Lookup, RequestOptions};
use crate::error::Result;
use crate::fetch::transport::{FetchRequest, Transport};

// == Cached Client ==
pub struct CachedClient<T = serde_json::Value> {
    cache: ApiCache<T>,
    transport: Arc<dyn Transport>,
}

impl<T> Clone for CachedClient<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> CachedClient<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(cache: ApiCache<T>, transport: Arc<dyn Transport>) -> Self {
        Self { cache, transport }
    }

    pub fn cache(&self) -> &ApiCache<T> {
        &self.cache
    }

    /// Fetches `url`, going through the cache for GET requests.
    ///
    /// With `force_refresh` the cache and any in-flight request are skipped
    /// and a new request is issued; its result still populates the cache.
    pub async fn cached_fetch(
        &self,
        url: &str,
        options: RequestOptions,
        force_refresh: bool,
    ) -> Result<T> {
        if !options.is_get() {
            debug!("Bypassing cache for {} {}", options.method(), url);
            let response = self
                .transport
                .send(&FetchRequest::new(url, &options))
                .await?;
            return response.into_json();
        }

        let lookup = self
            .cache
            .lookup_or_register(url, &options, force_refresh, || {
                self.request(url, &options)
            });

        match lookup {
            Lookup::Cached(data) => Ok(data),
            Lookup::Joined(future) | Lookup::Started(future) => future.await,
        }
    }

    /// GET shorthand without force refresh.
    pub async fn get(&self, url: &str) -> Result<T> {
        self.cached_fetch(url, RequestOptions::new(), false).await
    }

    fn request(&self, url: &str, options: &RequestOptions) -> BoxFuture<'static, Result<T>> {
        let transport = Arc::clone(&self.transport);
        let cache = self.cache.clone();
        let url = url.to_string();
        let options = options.clone();

        async move {
            let response = transport.send(&FetchRequest::new(&url, &options)).await?;
            let data: T = response.into_json().map_err(|err| {
                warn!("Fetch of {} failed: {}", url, err);
                err
            })?;
            cache.set(&url, data.clone(), &options);
            Ok(data)
        }
        .boxed()
    }
}

//! Cache Store Module
//!
//! `ApiCache` keeps fresh response bodies and the requests currently in
//! flight, both keyed by `METHOD:url:body`. Entries and pending requests
//! share one lock so that "look up, else join, else register" is a single
//! critical section.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::entry::{CacheEntry, PendingRequest, SharedFetch};
use crate::cache::key::{cache_key, RequestOptions};
use crate::cache::stats::CacheStats;
use crate::cache::ttl::TtlTable;
use crate::error::{ApiError, Result};

/// Age after which an in-flight request is treated as abandoned.
pub const PENDING_STALE_AFTER: Duration = Duration::from_secs(30);

// == Invalidate Pattern ==
/// Selects cache keys for invalidation.
#[derive(Debug, Clone)]
pub enum InvalidatePattern {
    /// Keys containing this text
    Substring(String),
    /// Keys the expression matches anywhere
    Regex(Regex),
}

impl InvalidatePattern {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            InvalidatePattern::Substring(text) => key.contains(text.as_str()),
            InvalidatePattern::Regex(re) => re.is_match(key),
        }
    }
}

impl From<&str> for InvalidatePattern {
    fn from(text: &str) -> Self {
        InvalidatePattern::Substring(text.to_string())
    }
}

impl From<String> for InvalidatePattern {
    fn from(text: String) -> Self {
        InvalidatePattern::Substring(text)
    }
}

impl From<Regex> for InvalidatePattern {
    fn from(re: Regex) -> Self {
        InvalidatePattern::Regex(re)
    }
}

// == Lookup Outcome ==
/// Result of the combined lookup used by `cached_fetch`.
pub enum Lookup<T> {
    /// Fresh entry found
    Cached(T),
    /// Joined a request already in flight
    Joined(SharedFetch<T>),
    /// Registered a new request
    Started(SharedFetch<T>),
}

// == Cache State ==
struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    pending: HashMap<String, PendingRequest<T>>,
    stats: CacheStats,
    next_request_id: u64,
}

impl<T: Clone> CacheState<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            pending: HashMap::new(),
            stats: CacheStats::new(),
            next_request_id: 0,
        }
    }

    /// Fresh data for `key`; expired entries are dropped on the way.
    fn lookup(&mut self, key: &str, now: Instant) -> Option<T> {
        let valid = self.entries.get(key).map(|entry| entry.is_valid(now));
        match valid {
            Some(true) => {
                self.stats.record_hit();
                self.entries.get(key).map(|entry| entry.data.clone())
            }
            Some(false) => {
                self.entries.remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn pending_lookup(
        &mut self,
        key: &str,
        now: Instant,
        stale_after: Duration,
    ) -> Option<SharedFetch<T>> {
        let stale = self.pending.get(key)?.is_stale(now, stale_after);
        if stale {
            warn!("Dropping stale in-flight request for {}", key);
            self.pending.remove(key);
            return None;
        }
        self.stats.record_dedup_join();
        self.pending.get(key).map(|p| p.future.clone())
    }
}

fn lock_state<T>(state: &Mutex<CacheState<T>>) -> MutexGuard<'_, CacheState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Pending Guard ==
/// Removes a pending record when its request settles, whether it returned
/// Ok, Err, or panicked. Only removes the record it registered.
struct PendingGuard<T> {
    state: Arc<Mutex<CacheState<T>>>,
    key: String,
    id: u64,
}

impl<T> Drop for PendingGuard<T> {
    fn drop(&mut self) {
        let mut state = lock_state(&self.state);
        if state.pending.get(&self.key).map_or(false, |p| p.id == self.id) {
            state.pending.remove(&self.key);
        }
    }
}

// == Api Cache ==
/// In-memory response cache with in-flight request deduplication.
///
/// Cloning is cheap and every clone shares the same state.
pub struct ApiCache<T> {
    state: Arc<Mutex<CacheState<T>>>,
    ttl_table: Arc<TtlTable>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl<T> Clone for ApiCache<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            ttl_table: Arc::clone(&self.ttl_table),
            clock: Arc::clone(&self.clock),
            stale_after: self.stale_after,
        }
    }
}

impl<T> std::fmt::Debug for ApiCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCache")
            .field("clock", &self.clock)
            .field("stale_after", &self.stale_after)
            .finish_non_exhaustive()
    }
}

impl<T> Default for ApiCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ApiCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache with the storefront TTL table, the system clock and
    /// the 30 second staleness window.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::new())),
            ttl_table: Arc::new(TtlTable::storefront()),
            clock: Arc::new(SystemClock),
            stale_after: PENDING_STALE_AFTER,
        }
    }

    pub fn with_ttl_table(mut self, table: TtlTable) -> Self {
        self.ttl_table = Arc::new(table);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        lock_state(&self.state)
    }

    /// TTL an entry for `url` would receive.
    pub fn ttl_for(&self, url: &str) -> Duration {
        self.ttl_table.ttl_for(url)
    }

    // == Get ==
    /// Returns fresh data for the request, or `None`.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, url: &str, options: &RequestOptions) -> Option<T> {
        let key = cache_key(url, options);
        let now = self.clock.now();
        self.lock().lookup(&key, now)
    }

    // == Set ==
    /// Stores `data`, replacing any existing entry. The TTL is resolved
    /// from the raw URL, not the key.
    pub fn set(&self, url: &str, data: T, options: &RequestOptions) {
        let key = cache_key(url, options);
        let ttl = self.ttl_table.ttl_for(url);
        let now = self.clock.now();
        debug!("Caching {} for {:?}", key, ttl);
        self.lock()
            .entries
            .insert(key, CacheEntry::new(data, now, ttl));
    }

    // == Pending Requests ==
    /// Returns the in-flight request for this key, unless it is older than
    /// the staleness window, in which case it is forgotten.
    pub fn get_pending_request(&self, url: &str, options: &RequestOptions) -> Option<SharedFetch<T>> {
        let key = cache_key(url, options);
        let now = self.clock.now();
        self.lock().pending_lookup(&key, now, self.stale_after)
    }

    /// Registers `request` as the in-flight request for this key and
    /// returns the shared handle every caller can await.
    ///
    /// The request runs as its own task so it completes even if all callers
    /// stop waiting. Its pending record is removed once it settles.
    /// Must be called within a Tokio runtime.
    pub fn set_pending_request<F>(
        &self,
        url: &str,
        options: &RequestOptions,
        request: F,
    ) -> SharedFetch<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let key = cache_key(url, options);
        let now = self.clock.now();
        let mut state = self.lock();
        self.register_pending(&mut state, key, now, request.boxed())
    }

    fn register_pending(
        &self,
        state: &mut CacheState<T>,
        key: String,
        now: Instant,
        request: BoxFuture<'static, Result<T>>,
    ) -> SharedFetch<T> {
        state.next_request_id += 1;
        let id = state.next_request_id;
        state.stats.record_network_fetch();

        let shared_state = Arc::clone(&self.state);
        let guard_key = key.clone();
        let handle = tokio::spawn(async move {
            let _guard = PendingGuard {
                state: shared_state,
                key: guard_key,
                id,
            };
            request.await
        });

        let future = async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(ApiError::Internal(format!("request task failed: {err}"))),
            }
        }
        .boxed()
        .shared();

        state.pending.insert(
            key,
            PendingRequest {
                id,
                future: future.clone(),
                timestamp: now,
            },
        );
        future
    }

    /// Serves from cache, else joins an in-flight request, else registers
    /// the request built by `make_request`. Runs under one lock acquisition.
    /// `force_refresh` skips straight to registering.
    pub fn lookup_or_register<F>(
        &self,
        url: &str,
        options: &RequestOptions,
        force_refresh: bool,
        make_request: F,
    ) -> Lookup<T>
    where
        F: FnOnce() -> BoxFuture<'static, Result<T>>,
    {
        let key = cache_key(url, options);
        let now = self.clock.now();
        let mut state = self.lock();

        if !force_refresh {
            if let Some(data) = state.lookup(&key, now) {
                debug!("Cache hit for {}", key);
                return Lookup::Cached(data);
            }
            if let Some(future) = state.pending_lookup(&key, now, self.stale_after) {
                debug!("Joining in-flight request for {}", key);
                return Lookup::Joined(future);
            }
        }

        debug!("Fetching {}", key);
        Lookup::Started(self.register_pending(&mut state, key, now, make_request()))
    }

    // == Invalidation ==
    /// Removes every entry whose key matches. Returns the number removed.
    pub fn invalidate(&self, pattern: impl Into<InvalidatePattern>) -> usize {
        let pattern = pattern.into();
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !pattern.matches(key));
        let removed = before - state.entries.len();
        state.stats.record_invalidations(removed);
        info!("Invalidated {} cache entries matching {:?}", removed, pattern);
        removed
    }

    /// Clears every entry. Returns the number removed.
    pub fn invalidate_all(&self) -> usize {
        let mut state = self.lock();
        let removed = state.entries.len();
        state.entries.clear();
        state.stats.record_invalidations(removed);
        info!("Invalidated all {} cache entries", removed);
        removed
    }

    // == Cleanup ==
    /// Evicts every expired entry. Returns the number removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_valid(now));
        let removed = before - state.entries.len();
        state.stats.record_expirations(removed);
        removed
    }

    // == Introspection ==
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let mut stats = state.stats.clone();
        stats.total_entries = state.entries.len();
        stats.pending_requests = state.pending.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }
}

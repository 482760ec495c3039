//! Cache Entry Module
//!
//! Defines cached responses and in-flight request records.

use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};

use crate::error::Result;

/// Future shared by every caller waiting on the same physical request.
pub type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;

// == Cache Entry ==
/// A cached response body with its write time and TTL.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The deserialized response body
    pub data: T,
    /// Write time
    pub timestamp: Instant,
    /// Lifetime resolved from the TTL table at write time
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    pub fn new(data: T, timestamp: Instant, ttl: Duration) -> Self {
        Self {
            data,
            timestamp,
            ttl,
        }
    }

    // == Is Valid ==
    /// Checks if the entry is still fresh at `now`.
    ///
    /// Boundary condition: an entry whose age equals its TTL is already
    /// invalid, so validity is `age < ttl`.
    pub fn is_valid(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) < self.ttl
    }

    /// Remaining lifetime at `now`, zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.timestamp))
    }
}

// == Pending Request ==
/// A request currently in flight for some cache key.
pub struct PendingRequest<T> {
    /// Identifies which request registered this record
    pub id: u64,
    pub future: SharedFetch<T>,
    /// Registration time, used for the staleness window
    pub timestamp: Instant,
}

impl<T> PendingRequest<T> {
    pub fn is_stale(&self, now: Instant, stale_after: Duration) -> bool {
        now.saturating_duration_since(self.timestamp) >= stale_after
    }
}

impl<T> std::fmt::Debug for PendingRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

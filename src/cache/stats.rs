//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses and deduplicated joins.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Reads answered from a fresh entry
    pub hits: u64,
    /// Reads that found no fresh entry
    pub misses: u64,
    /// Callers that joined a request already in flight
    pub dedup_joins: u64,
    /// Physical requests issued to the transport
    pub network_fetches: u64,
    /// Entries removed by invalidate / invalidate_all
    pub invalidations: u64,
    /// Entries removed because they expired
    pub expirations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current number of requests in flight
    pub pending_requests: usize,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_dedup_join(&mut self) {
        self.dedup_joins += 1;
    }

    pub fn record_network_fetch(&mut self) {
        self.network_fetches += 1;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}

//! Cache Module
//!
//! In-memory API response cache with TTL expiration, URL-pattern TTL rules
//! and in-flight request deduplication.

mod clock;
mod entry;
mod key;
mod stats;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, PendingRequest, SharedFetch};
pub use key::{cache_key, scope_for_credential, RequestOptions};
pub use stats::CacheStats;
pub use store::{ApiCache, InvalidatePattern, Lookup, PENDING_STALE_AFTER};
pub use ttl::{TtlRule, TtlTable, DEFAULT_TTL};

// == Public Constants ==
/// Interval between background sweeps of expired entries
pub const CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5 * 60);

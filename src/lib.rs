//! Storefront Cache - API response cache for the beauty storefront
//!
//! Caches GET responses with per-endpoint TTLs and collapses identical
//! concurrent requests into one upstream call.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{ApiCache, RequestOptions, TtlTable};
pub use config::Config;
pub use error::{ApiError, Result};
pub use fetch::{CachedClient, ReqwestTransport, Transport};
pub use tasks::spawn_cleanup_task;

//! Configuration Module
//!
//! Handles loading gateway and cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{CLEANUP_INTERVAL, DEFAULT_TTL, PENDING_STALE_AFTER};

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the storefront REST API
    pub upstream_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for URLs no rule matches
    pub default_ttl: u64,
    /// Age in seconds after which an in-flight request is considered abandoned
    pub pending_stale_after: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Upstream request timeout in seconds
    pub request_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UPSTREAM_URL` - Storefront API base URL (default: http://127.0.0.1:5000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL` - Fallback TTL in seconds (default: 300)
    /// - `PENDING_STALE_AFTER` - In-flight staleness window in seconds (default: 30)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 300)
    /// - `REQUEST_TIMEOUT` - Upstream timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.upstream_url),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            pending_stale_after: parse_var("PENDING_STALE_AFTER")
                .unwrap_or(defaults.pending_stale_after),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            request_timeout: parse_var("REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn pending_stale_after(&self) -> Duration {
        Duration::from_secs(self.pending_stale_after)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: "http://127.0.0.1:5000".to_string(),
            server_port: 3000,
            default_ttl: DEFAULT_TTL.as_secs(),
            pending_stale_after: PENDING_STALE_AFTER.as_secs(),
            cleanup_interval: CLEANUP_INTERVAL.as_secs(),
            request_timeout: 30,
        }
    }
}

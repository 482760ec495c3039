//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use regex::Regex;
use serde::Deserialize;

use crate::cache::InvalidatePattern;
use crate::error::{ApiError, Result};

/// Request body for POST /_cache/invalidate
///
/// # Fields
/// - `pattern`: Text or regular expression matched against cache keys
/// - `regex`: Treat `pattern` as a regular expression (default: substring)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub pattern: String,
    #[serde(default)]
    pub regex: bool,
}

impl InvalidateRequest {
    /// Validates the request and builds the matching pattern.
    pub fn into_pattern(self) -> Result<InvalidatePattern> {
        if self.pattern.is_empty() {
            return Err(ApiError::InvalidRequest(
                "Pattern cannot be empty".to_string(),
            ));
        }
        if self.regex {
            let re = Regex::new(&self.pattern)
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid regex: {e}")))?;
            Ok(InvalidatePattern::Regex(re))
        } else {
            Ok(InvalidatePattern::Substring(self.pattern))
        }
    }
}

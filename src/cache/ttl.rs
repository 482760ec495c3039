//! TTL Rule Table
//!
//! Ordered URL pattern table deciding how long a response stays fresh.
//! Rules are evaluated top to bottom and the first match wins, so specific
//! patterns must be listed before general ones.

use std::time::Duration;

use regex::Regex;

use crate::error::{ApiError, Result};

/// TTL used when no rule matches.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

const fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

/// Storefront endpoints, most specific first. Every pattern ends on a
/// segment boundary so `/products-bundles` is not read as `/products`.
const STOREFRONT_RULES: &[(&str, &str, Duration)] = &[
    ("types", r"/(?:(?:product-)?types|subcategories)(?:[/?#]|$)", minutes(10)),
    ("taxonomies", r"/(?:categories|brands|concerns)(?:[/?#]|$)", minutes(15)),
    ("featured-products", r"/products/(?:featured|top-selling)(?:[/?#]|$)", minutes(5)),
    ("product", r"/products/[^/?#]+/?(?:[?#]|$)", minutes(3)),
    ("products", r"/products(?:[/?#]|$)", minutes(2)),
    ("review-stats", r"/reviews/(?:batch|stats)(?:[/?#]|$)", minutes(10)),
    ("reviews", r"/reviews(?:[/?#]|$)", minutes(5)),
    ("offers", r"/offers(?:[/?#]|$)", minutes(5)),
    ("analytics", r"/analytics(?:[/?#]|$)", minutes(2)),
    ("cart", r"/(?:cart|wishlist)(?:[/?#]|$)", minutes(1)),
    ("account", r"/(?:addresses|orders)(?:[/?#]|$)", minutes(2)),
    ("auth-profile", r"/auth/(?:me|profile)(?:[/?#]|$)", minutes(5)),
];

// == TTL Rule ==
#[derive(Debug, Clone)]
pub struct TtlRule {
    pub name: String,
    pub pattern: Regex,
    pub ttl: Duration,
}

// == TTL Table ==
#[derive(Debug, Clone)]
pub struct TtlTable {
    rules: Vec<TtlRule>,
    default_ttl: Duration,
}

impl TtlTable {
    /// Creates an empty table; every URL resolves to `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            rules: Vec::new(),
            default_ttl,
        }
    }

    /// The storefront table with the standard five minute fallback.
    pub fn storefront() -> Self {
        Self::storefront_with_default(DEFAULT_TTL)
    }

    /// The storefront table with a custom fallback TTL.
    pub fn storefront_with_default(default_ttl: Duration) -> Self {
        let rules = STOREFRONT_RULES
            .iter()
            .map(|(name, pattern, ttl)| TtlRule {
                name: (*name).to_string(),
                pattern: Regex::new(pattern).expect("storefront TTL patterns are valid regexes"),
                ttl: *ttl,
            })
            .collect();
        Self { rules, default_ttl }
    }

    /// Appends a rule at the lowest priority.
    pub fn with_rule(
        mut self,
        name: impl Into<String>,
        pattern: &str,
        ttl: Duration,
    ) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid TTL pattern: {e}")))?;
        self.rules.push(TtlRule {
            name: name.into(),
            pattern,
            ttl,
        });
        Ok(self)
    }

    /// First matching rule for `url`, if any.
    pub fn matching_rule(&self, url: &str) -> Option<&TtlRule> {
        self.rules.iter().find(|rule| rule.pattern.is_match(url))
    }

    /// TTL for `url`. Matches against the raw URL so path segments and
    /// query parameters are visible to the patterns.
    pub fn ttl_for(&self, url: &str) -> Duration {
        self.matching_rule(url)
            .map_or(self.default_ttl, |rule| rule.ttl)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn rules(&self) -> &[TtlRule] {
        &self.rules
    }
}

impl Default for TtlTable {
    fn default() -> Self {
        Self::storefront()
    }
}

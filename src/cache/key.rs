//! Cache key generation.

use sha2::{Digest, Sha256};

/// Per-request options, mirroring a fetch call's `{ method, headers, body }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// HTTP method; `None` means GET
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Principal the response belongs to; keeps cached data from crossing users
    pub scope: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Upper-cased method, defaulting to GET.
    pub fn method(&self) -> String {
        self.method
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| "GET".to_string())
    }

    /// True for requests that may be cached and deduplicated.
    pub fn is_get(&self) -> bool {
        self.method
            .as_deref()
            .map_or(true, |m| m.eq_ignore_ascii_case("GET"))
    }
}

/// Builds the cache key for a request.
///
/// Format is `METHOD:url:body`, with `#scope` appended for scoped requests.
/// The URL stays readable inside the key so invalidation patterns can
/// target resource paths.
pub fn cache_key(url: &str, options: &RequestOptions) -> String {
    let body = options.body.as_deref().unwrap_or("");
    let mut key = format!("{}:{}:{}", options.method(), url, body);
    if let Some(scope) = &options.scope {
        key.push('#');
        key.push_str(scope);
    }
    key
}

/// Derives a short opaque scope from a credential such as an `Authorization` header.
pub fn scope_for_credential(credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    hasher
        .finalize()
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

//! HTTP Transport
//!
//! The network seam behind `cached_fetch`. `ReqwestTransport` is the real
//! implementation; tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::cache::RequestOptions;
use crate::error::{ApiError, Result};

// == Fetch Request ==
/// A fully described outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl FetchRequest {
    pub fn new(url: &str, options: &RequestOptions) -> Self {
        Self {
            method: options.method(),
            url: url.to_string(),
            headers: options.headers.clone(),
            body: options.body.clone(),
        }
    }
}

// == Http Response ==
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON. An empty body parses as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Fails with `HTTP <status>: <statusText>` on non-2xx, otherwise parses the body.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        if !self.is_success() {
            return Err(ApiError::Http {
                status: self.status,
                status_text: self.status_text,
            });
        }
        self.json()
    }
}

// == Transport Trait ==
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request. Only network failures are errors; any HTTP status
    /// is returned as a response.
    async fn send(&self, request: &FetchRequest) -> Result<HttpResponse>;
}

// == Reqwest Transport ==
/// Transport over a pooled `reqwest::Client`.
///
/// Relative URLs are resolved against `base_url` when one is set.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.starts_with("http://") && !url.starts_with("https://") => {
                format!("{}{}", base, url)
            }
            _ => url.to_string(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &FetchRequest) -> Result<HttpResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ApiError::InvalidRequest(format!("bad method: {}", request.method)))?;

        let mut builder = self.client.request(method, self.resolve(&request.url));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        Ok(HttpResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            body,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_fetch_request_defaults_to_get() {
        let request = FetchRequest::new("/api/brands", &RequestOptions::new());
        assert_eq!(request.method, "GET");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_non_success_is_http_error() {
        let response = HttpResponse::new(404, "Not Found", "{\"error\":\"x\"}");
        let result: Result<Value> = response.into_json();
        assert_eq!(result.unwrap_err().to_string(), "HTTP 404: Not Found");
    }

    #[test]
    fn test_empty_body_is_null() {
        let response = HttpResponse::new(204, "No Content", Bytes::new());
        let value: Value = response.into_json().unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let response = HttpResponse::new(200, "OK", "<html>");
        let result: Result<Value> = response.into_json();
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_resolve_relative_urls() {
        let transport = ReqwestTransport::new(Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://shop.local/");
        assert_eq!(transport.resolve("/api/cart"), "http://shop.local/api/cart");
        assert_eq!(transport.resolve("https://cdn.local/x"), "https://cdn.local/x");
    }

    #[tokio::test]
    async fn test_reqwest_transport_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/brands")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":1,"name":"Glow"}]"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url());
        let response = transport
            .send(&FetchRequest::new("/api/brands", &RequestOptions::new()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        let brands: Value = response.into_json().unwrap();
        assert_eq!(brands[0]["name"], "Glow");
        mock.assert_async().await;
    }
}

//! Fetch Module
//!
//! HTTP transport seam and the `cached_fetch` entry point.

mod client;
mod transport;

pub use client::CachedClient;
pub use transport::{FetchRequest, HttpResponse, ReqwestTransport, Transport};

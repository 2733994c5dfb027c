//! Origin Module
//!
//! The outbound side of the proxy: the capability used to fetch a response
//! from the origin server, and its reqwest implementation.

mod client;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName, Method};
use bytes::Bytes;

use crate::error::OriginError;
use crate::models::ResponseSnapshot;

pub use client::HttpOriginClient;

/// One outbound request to the origin.
#[derive(Debug, Clone)]
pub struct OriginRequest {
    pub method: Method,
    /// Absolute URL: origin base + inbound path and query
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

// == Origin Client Trait ==
/// Fetches responses from the origin server.
///
/// Implementations bound every call by a timeout, keep no state between
/// calls and never touch the response cache. Dropping the returned future
/// cancels the fetch.
#[async_trait]
pub trait OriginClient: Send + Sync {
    async fn fetch(&self, request: OriginRequest) -> Result<ResponseSnapshot, OriginError>;
}

/// Connection-scoped headers that must not be relayed (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Removes hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

//! HTTP Origin Client
//!
//! reqwest-backed [`OriginClient`] with a per-request timeout.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::header;
use reqwest::redirect::Policy;
use tracing::debug;

use super::{strip_hop_by_hop, OriginClient, OriginRequest};
use crate::error::{ConfigError, OriginError};
use crate::models::ResponseSnapshot;

/// Forwards requests to the origin over HTTP.
///
/// Redirects are relayed to the caller instead of being followed, and bodies
/// are passed through undecoded.
#[derive(Clone)]
pub struct HttpOriginClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpOriginClient {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> OriginError {
        if err.is_timeout() {
            OriginError::Timeout(self.timeout)
        } else {
            OriginError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl OriginClient for HttpOriginClient {
    async fn fetch(&self, request: OriginRequest) -> Result<ResponseSnapshot, OriginError> {
        let mut headers = request.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        let mut outbound = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(headers);
        if !request.body.is_empty() {
            outbound = outbound.body(request.body);
        }

        let response = outbound.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);

        // The client timeout also bounds the body; a stall there is still a timeout
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                OriginError::Timeout(self.timeout)
            } else {
                OriginError::Read(e.to_string())
            }
        })?;

        debug!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );
        Ok(ResponseSnapshot::new(status, headers, body))
    }
}

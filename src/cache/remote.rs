//! Redis Cache Backend
//!
//! Stores responses in an external redis server so several proxy instances can
//! share one cache. Expiry is delegated to redis (`PSETEX`); capacity is
//! whatever the redis server's own eviction policy allows.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheStats, ResponseCache, MAX_BODY_SIZE};
use crate::error::{CacheError, ConfigError};
use crate::models::ResponseSnapshot;

/// Connection parameters for [`RedisCache`].
#[derive(Debug, Clone)]
pub struct RedisSettings {
    /// Connection URL, e.g. `redis://default@localhost:6379`
    pub url: String,
    /// Prefix applied to every key
    pub prefix: String,
    /// Bound on connecting and on every single command
    pub timeout: Duration,
}

// == Wire Format ==
/// JSON document stored under each redis key. Header values and the body
/// are base64 so arbitrary bytes survive without inflating into number arrays.
#[derive(Debug, Serialize, Deserialize)]
struct WireEntry {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
    expires_at: u64,
}

fn codec_error(e: impl std::fmt::Display) -> CacheError {
    CacheError::Codec(e.to_string())
}

fn encode(response: &ResponseSnapshot, expires_at: u64) -> Result<Vec<u8>, CacheError> {
    let headers = response
        .headers
        .iter()
        .map(|(name, value)| (name.as_str().to_string(), BASE64.encode(value.as_bytes())))
        .collect();
    let wire = WireEntry {
        status: response.status.as_u16(),
        headers,
        body: BASE64.encode(&response.body),
        expires_at,
    };
    serde_json::to_vec(&wire).map_err(codec_error)
}

/// Decodes a stored entry; `None` once it is past its expiry.
fn decode(raw: &[u8], now_ms: u64) -> Result<Option<ResponseSnapshot>, CacheError> {
    let wire: WireEntry = serde_json::from_slice(raw).map_err(codec_error)?;
    if now_ms >= wire.expires_at {
        return Ok(None);
    }

    let status = StatusCode::from_u16(wire.status).map_err(codec_error)?;
    let mut headers = HeaderMap::with_capacity(wire.headers.len());
    for (name, value) in wire.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(codec_error)?;
        let value = BASE64.decode(value).map_err(codec_error)?;
        let value = HeaderValue::from_bytes(&value).map_err(codec_error)?;
        headers.append(name, value);
    }
    let body = BASE64.decode(wire.body).map_err(codec_error)?;

    Ok(Some(ResponseSnapshot::new(status, headers, body)))
}

// == Redis Cache ==
/// Redis-backed response cache.
///
/// Hits and misses are counted locally; entry counts come from the server.
pub struct RedisCache {
    conn: MultiplexedConnection,
    settings: RedisSettings,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RedisCache {
    /// Connects and PINGs the server, failing with a descriptive error when
    /// it cannot be reached within the configured timeout.
    pub async fn connect(settings: RedisSettings) -> Result<Self, ConfigError> {
        let unreachable = |reason: String| ConfigError::BackendUnreachable {
            backend: "redis",
            reason,
        };

        let client = Client::open(settings.url.as_str()).map_err(|e| unreachable(e.to_string()))?;

        let mut conn = tokio::time::timeout(
            settings.timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| unreachable(format!("connect timed out after {:?}", settings.timeout)))?
        .map_err(|e| unreachable(e.to_string()))?;

        let ping = redis::cmd("PING");
        let pong: String = tokio::time::timeout(settings.timeout, ping.query_async(&mut conn))
            .await
            .map_err(|_| unreachable(format!("PING timed out after {:?}", settings.timeout)))?
            .map_err(|e| unreachable(e.to_string()))?;

        info!("Connected to redis cache backend ({})", pong);

        Ok(Self {
            conn,
            settings,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.settings.prefix, key)
    }

    async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.settings.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Backend(format!("redis {} failed: {}", op, e))),
            Err(_) => Err(CacheError::Backend(format!(
                "redis {} timed out after {:?}",
                op, self.settings.timeout
            ))),
        }
    }

    /// Keys under our prefix, walked with incremental `SCAN`.
    async fn matching_keys(&self) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.settings.prefix);
        self.run("SCAN", async {
            let mut iter = conn.scan_match::<_, String>(pattern).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            Ok::<_, redis::RedisError>(keys)
        })
        .await
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<ResponseSnapshot>, CacheError> {
        let mut conn = self.conn.clone();
        let prefixed = self.prefixed_key(key);

        let raw: Option<Vec<u8>> = self.run("GET", conn.get(&prefixed)).await?;
        let found = match raw {
            Some(raw) => decode(&raw, current_timestamp_ms())?,
            None => None,
        };

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    async fn set(
        &self,
        key: &str,
        response: ResponseSnapshot,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if response.body.len() > MAX_BODY_SIZE {
            return Err(CacheError::InvalidEntry(format!(
                "Body exceeds maximum size of {} bytes",
                MAX_BODY_SIZE
            )));
        }

        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let payload = encode(&response, current_timestamp_ms().saturating_add(ttl_ms))?;

        let mut conn = self.conn.clone();
        let prefixed = self.prefixed_key(key);
        self.run("PSETEX", conn.pset_ex(&prefixed, payload, ttl_ms)).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let prefixed = self.prefixed_key(key);
        let deleted: i64 = self.run("DEL", conn.del(&prefixed)).await?;
        Ok(deleted > 0)
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        let keys = self.matching_keys().await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let deleted: i64 = self.run("DEL", conn.del(&keys)).await?;
        Ok(usize::try_from(deleted).unwrap_or(0))
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let keys = self.matching_keys().await?;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            total_entries: keys.len(),
            ..CacheStats::default()
        })
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn sample() -> ResponseSnapshot {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        headers.append(header::SET_COOKIE, "a=1".parse().unwrap());
        headers.append(header::SET_COOKIE, "b=2".parse().unwrap());
        ResponseSnapshot::new(StatusCode::CREATED, headers, vec![0u8, 159, 146, 150])
    }

    #[test]
    fn test_wire_entry_preserves_response() {
        let raw = encode(&sample(), 2_000).unwrap();
        let decoded = decode(&raw, 1_000).unwrap();
        assert_eq!(decoded, Some(sample()));
    }

    #[test]
    fn test_wire_entry_stores_body_as_base64() {
        let body = vec![0xffu8; 3 * 1024];
        let response = ResponseSnapshot::new(StatusCode::OK, HeaderMap::new(), body.clone());

        let raw = encode(&response, 2_000).unwrap();
        // base64 grows by 4/3, a JSON number array by roughly 4x for 0xff bytes
        assert!(raw.len() < body.len() * 3 / 2);

        let wire: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert!(wire["body"].is_string());
        assert_eq!(decode(&raw, 1_000).unwrap().unwrap().body, body);
    }

    #[test]
    fn test_decode_invalid_base64_is_codec_error() {
        let raw = br#"{"status":200,"headers":[],"body":"***","expires_at":2000}"#;
        assert!(matches!(decode(raw, 1_000), Err(CacheError::Codec(_))));
    }

    #[test]
    fn test_decode_expired_is_miss() {
        let raw = encode(&sample(), 2_000).unwrap();
        assert_eq!(decode(&raw, 2_000).unwrap(), None);
    }

    #[test]
    fn test_decode_garbage_is_codec_error() {
        assert!(matches!(
            decode(b"not json", 0),
            Err(CacheError::Codec(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_unreachable_fails_fast() {
        let settings = RedisSettings {
            url: "redis://127.0.0.1:1".to_string(),
            prefix: "test:".to_string(),
            timeout: Duration::from_millis(500),
        };

        let result = RedisCache::connect(settings).await;
        assert!(matches!(
            result,
            Err(ConfigError::BackendUnreachable { backend: "redis", .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_invalid_url() {
        let settings = RedisSettings {
            url: "definitely not a url".to_string(),
            prefix: "test:".to_string(),
            timeout: Duration::from_millis(500),
        };

        assert!(RedisCache::connect(settings).await.is_err());
    }
}

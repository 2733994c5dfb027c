//! Test doubles for the proxy handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};

use crate::api::{AppState, ProxySettings};
use crate::cache::{CacheStats, MemoryCache, ResponseCache};
use crate::error::{CacheError, OriginError};
use crate::models::ResponseSnapshot;
use crate::origin::{OriginClient, OriginRequest};

pub const ORIGIN_BASE: &str = "http://origin.test";

/// Origin that answers every request from a closure and records calls.
pub struct MockOrigin {
    calls: AtomicUsize,
    last: Mutex<Option<OriginRequest>>,
    respond: Box<dyn Fn(&OriginRequest) -> Result<ResponseSnapshot, OriginError> + Send + Sync>,
}

impl MockOrigin {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&OriginRequest) -> Result<ResponseSnapshot, OriginError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            respond: Box::new(respond),
        })
    }

    /// Echoes method and URL in the body; numbers each response in `x-call`.
    pub fn echo() -> Arc<Self> {
        let counter = AtomicUsize::new(0);
        Self::new(move |req| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
            headers.insert("x-call", n.to_string().parse().unwrap());
            headers.append(header::SET_COOKIE, "a=1".parse().unwrap());
            headers.append(header::SET_COOKIE, "b=2".parse().unwrap());
            let body = format!("{} {}", req.method, req.url);
            Ok(ResponseSnapshot::new(StatusCode::OK, headers, body))
        })
    }

    pub fn failing(err: fn() -> OriginError) -> Arc<Self> {
        Self::new(move |_| Err(err()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<OriginRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl OriginClient for MockOrigin {
    async fn fetch(&self, request: OriginRequest) -> Result<ResponseSnapshot, OriginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = (self.respond)(&request);
        *self.last.lock().unwrap() = Some(request);
        result
    }
}

/// Cache backend that is always down.
pub struct FailingCache;

#[async_trait]
impl ResponseCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<ResponseSnapshot>, CacheError> {
        Err(CacheError::Backend("connection reset".to_string()))
    }

    async fn set(&self, _: &str, _: ResponseSnapshot, _: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection reset".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Backend("connection reset".to_string()))
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        Err(CacheError::Backend("connection reset".to_string()))
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Err(CacheError::Backend("connection reset".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub fn settings(ttl: Duration) -> ProxySettings {
    ProxySettings {
        origin_base: ORIGIN_BASE.to_string(),
        default_ttl: ttl,
    }
}

pub fn memory_state(origin: Arc<MockOrigin>, capacity: usize, ttl: Duration) -> AppState {
    AppState::with_memory_cache(MemoryCache::new(capacity), origin, settings(ttl))
}

//! Integration Tests for the Proxy
//!
//! Runs a real origin server on an ephemeral port and drives the proxy
//! router against it through the reqwest-backed origin client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request as OriginInbound, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use cache_proxy::{
    api::{create_router, AppState, ProxySettings},
    cache::{MemoryCache, ResponseCache},
    models::ResponseSnapshot,
    origin::HttpOriginClient,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

/// Starts an origin server and returns its base URL and request counter.
async fn spawn_origin() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    async fn page(State(hits): State<Arc<AtomicUsize>>, request: OriginInbound) -> Response {
        let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default();

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        headers.insert("x-origin-hit", n.to_string().parse().unwrap());
        headers.append(header::SET_COOKIE, "session=abc".parse().unwrap());
        headers.append(header::SET_COOKIE, "theme=dark".parse().unwrap());

        (
            StatusCode::CREATED,
            headers,
            format!("{} {} #{}", request.method(), target, n),
        )
            .into_response()
    }

    let app = Router::new().fallback(page).with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

/// A base URL nothing is listening on.
async fn dead_origin() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn proxy_state(origin_base: String, cache: MemoryCache, ttl: Duration) -> AppState {
    let client = HttpOriginClient::new(Duration::from_secs(5)).unwrap();
    AppState::with_memory_cache(
        cache,
        Arc::new(client),
        ProxySettings {
            origin_base,
            default_ttl: ttl,
        },
    )
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (parts.status, parts.headers, bytes)
}

// == Transparency ==

#[tokio::test]
async fn test_cache_hit_replays_status_headers_and_body() {
    let (origin, hits) = spawn_origin().await;
    let app = create_router(proxy_state(
        origin,
        MemoryCache::new(10),
        Duration::from_secs(60),
    ));

    let miss = send(&app, "GET", "/articles/1?lang=en").await;
    let hit = send(&app, "GET", "/articles/1?lang=en").await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(miss.0, StatusCode::CREATED);
    assert_eq!(&miss.2[..], b"GET /articles/1?lang=en #1");
    assert_eq!(miss.1.get("x-origin-hit").unwrap(), "1");

    let cookies: Vec<_> = miss.1.get_all(header::SET_COOKIE).iter().collect();
    assert_eq!(cookies, vec!["session=abc", "theme=dark"]);

    assert_eq!(hit, miss);
}

#[tokio::test]
async fn test_post_is_forwarded_every_time() {
    let (origin, hits) = spawn_origin().await;
    let app = create_router(proxy_state(
        origin,
        MemoryCache::new(10),
        Duration::from_secs(60),
    ));

    let first = send(&app, "POST", "/form").await;
    let second = send(&app, "POST", "/form").await;

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(&first.2[..], b"POST /form #1");
    assert_eq!(&second.2[..], b"POST /form #2");
}

// == Upstream Failure ==

#[tokio::test]
async fn test_unreachable_origin_returns_bad_gateway_without_caching() {
    let cache = MemoryCache::new(10);
    let app = create_router(proxy_state(
        dead_origin().await,
        cache.clone(),
        Duration::from_secs(60),
    ));

    let (status, _, body) = send(&app, "GET", "/down").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json.get("error").is_some());
    assert_eq!(cache.stats().await.unwrap().total_entries, 0);
    assert!(!cache.store().read().await.contains("/down"));
}

// == Eviction and Expiry ==

#[tokio::test]
async fn test_capacity_two_eviction_and_expiry() {
    let (origin, hits) = spawn_origin().await;
    let cache = MemoryCache::new(2);
    let app = create_router(proxy_state(origin, cache.clone(), Duration::from_secs(1)));

    send(&app, "GET", "/a").await;
    send(&app, "GET", "/b").await;
    send(&app, "GET", "/a").await; // hit, promotes /a
    send(&app, "GET", "/c").await; // evicts /b
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    {
        let store = cache.store();
        let store = store.read().await;
        assert!(store.contains("/a"));
        assert!(store.contains("/c"));
        assert!(!store.contains("/b"));
        assert_eq!(store.stats().evictions, 1);
    }

    tokio::time::sleep(Duration::from_millis(1100)).await;

    send(&app, "GET", "/a").await;
    assert_eq!(hits.load(Ordering::SeqCst), 4, "expired entry must be refetched");
}

// == Admin Endpoints ==

#[tokio::test]
async fn test_admin_invalidate_forces_refetch() {
    let (origin, hits) = spawn_origin().await;
    let app = create_router(proxy_state(
        origin,
        MemoryCache::new(10),
        Duration::from_secs(60),
    ));

    send(&app, "GET", "/report").await;
    let (status, _, _) = send(&app, "DELETE", "/_proxy/cache/entry?key=%2Freport").await;
    assert_eq!(status, StatusCode::OK);

    send(&app, "GET", "/report").await;
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    let (status, _, body) = send(&app, "GET", "/_proxy/stats").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["backend"], "memory");
    assert_eq!(json["total_entries"], 1);
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_preserves_invariants() {
    let capacity = 8;
    let cache = MemoryCache::new(capacity);

    let mut tasks = Vec::new();
    for worker in 0..16 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..200 {
                let key = format!("/k{}", (worker * 7 + i) % 24);
                if i % 3 == 0 {
                    let response = ResponseSnapshot::new(
                        StatusCode::OK,
                        HeaderMap::new(),
                        format!("{}-{}", worker, i),
                    );
                    cache
                        .set(&key, response, Duration::from_secs(60))
                        .await
                        .unwrap();
                } else {
                    let _ = cache.get(&key).await.unwrap();
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let store = cache.store();
    let store = store.read().await;
    assert!(store.is_consistent());
    assert!(store.len() <= capacity);
    assert_eq!(store.stats().total_entries, store.len());
}

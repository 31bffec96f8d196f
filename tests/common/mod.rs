//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use object_gateway::config::GatewayConfig;
use object_gateway::observability::metrics::detached_handle;
use object_gateway::store::memory::MemoryObject;
use object_gateway::store::MemoryStore;
use object_gateway::{build_router, AppState};

/// A configuration with a bucket and nothing else enabled.
pub fn config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.store.bucket = "site".into();
    config.site.content_encoding = false;
    config
}

/// A store holding a small static site.
pub fn site_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.put("index.html", MemoryObject::new("<h1>home</h1>", "text/html"));
    store.put("docs/index.html", MemoryObject::new("<h1>docs</h1>", "text/html"));
    store.put("docs/guide.txt", MemoryObject::new("read me", "text/plain"));
    store.put("my file.txt", MemoryObject::new("spaced", "text/plain"));
    store
}

/// Router over `store`, with a metrics handle that is not installed globally.
pub fn app(config: GatewayConfig, store: Arc<MemoryStore>) -> Router {
    build_router(AppState::new(config, store, Some(detached_handle())))
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

/// Attach the TCP peer address the way the real server does.
pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Drive one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body,
    }
}

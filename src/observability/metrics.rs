//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, store calls, cache, health)
//! - Expose a Prometheus handle rendered on the configured metrics path
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, status
//! - `http_request_duration_seconds` (histogram): latency by method
//! - `store_requests_total` (counter): store calls by action, code, source
//! - `cache_lookups_total` (counter): response cache hits and misses
//! - `healthcheck_requests_total` (counter): health probes by status
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels never include keys or paths (bounded cardinality)

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Store call kinds used as the `action` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Get,
    Head,
    List,
}

impl StoreAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreAction::Get => "GetObject",
            StoreAction::Head => "HeadObject",
            StoreAction::List => "ListObjects",
        }
    }
}

/// Install the process-wide Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// A handle backed by a recorder that is not installed globally.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

/// Record a store call; `code` is `OK` or the error code.
pub fn record_store_request(action: StoreAction, code: &'static str, source: &'static str) {
    metrics::counter!(
        "store_requests_total",
        "action" => action.as_str(),
        "code" => code,
        "source" => source
    )
    .increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("cache_lookups_total", "result" => result).increment(1);
}

pub fn record_healthcheck(healthy: bool) {
    let status = if healthy { "healthy" } else { "unhealthy" };
    metrics::counter!("healthcheck_requests_total", "status" => status).increment(1);
}

/// Middleware that records request count and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!("http_requests_total", "method" => method.clone(), "status" => status)
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_labels() {
        assert_eq!(StoreAction::Get.as_str(), "GetObject");
        assert_eq!(StoreAction::Head.as_str(), "HeadObject");
        assert_eq!(StoreAction::List.as_str(), "ListObjects");
    }

    #[test]
    fn test_detached_handle_renders() {
        let handle = detached_handle();
        record_cache_lookup(true);
        // the detached recorder is not the global one
        assert!(!handle.render().contains("cache_lookups_total"));
    }
}

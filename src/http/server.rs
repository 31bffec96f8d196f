//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the side channels and the gateway fallback
//! - Wire up middleware (request id, tracing, timeout, compression, metrics,
//!   access log, auth gate)
//! - Serve on a plain listener or over TLS, with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{Extensions, HeaderMap, Method, StatusCode, Uri, Version},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::ResponseCache;
use crate::config::{path_enabled, GatewayConfig};
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::health::{HealthProbe, HealthReport};
use crate::http::middleware::{access_control_middleware, access_log_middleware};
use crate::http::request::{make_request_span, UuidRequestId};
use crate::lifecycle::Shutdown;
use crate::observability::metrics::metrics_middleware;
use crate::security::AuthGate;
use crate::store::ObjectStore;

/// Time given to in-flight TLS connections once shutdown starts.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub gate: Arc<AuthGate>,
    pub health: Arc<HealthProbe>,
    pub metrics: Option<PrometheusHandle>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Assemble the request-path components from configuration.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn ObjectStore>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let cache = Arc::new(ResponseCache::new(&config.cache));
        let gateway = Arc::new(Gateway::new(&config, store.clone(), cache));
        let gate = Arc::new(AuthGate::from_config(&config.auth, &config.cors));
        let health = Arc::new(HealthProbe::new(store, config.observability.health_key()));

        Self {
            gateway,
            gate,
            health,
            metrics,
            config: Arc::new(config),
        }
    }

    /// Whether `path` is one of the configured side-channel endpoints.
    pub fn is_side_channel(&self, path: &str) -> bool {
        let obs = &self.config.observability;
        [&obs.health_check_path, &obs.metrics_path, &obs.version_path]
            .into_iter()
            .any(|p| path_enabled(p) && p == path)
    }
}

fn compress_always(_: StatusCode, _: Version, _: &HeaderMap, _: &Extensions) -> bool {
    true
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let obs = &config.observability;

    let mut router = Router::new();
    if path_enabled(&obs.health_check_path) {
        router = router.route(&obs.health_check_path, get(health_handler));
    }
    if path_enabled(&obs.version_path) {
        router = router.route(&obs.version_path, get(version_handler));
    }
    if path_enabled(&obs.metrics_path) && state.metrics.is_some() {
        router = router.route(&obs.metrics_path, get(metrics_handler));
    }

    let mut router = router
        .fallback(gateway_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access_control_middleware,
        ));
    if obs.access_log {
        router = router.layer(middleware::from_fn_with_state(
            state.clone(),
            access_log_middleware,
        ));
    }
    let mut router = router
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(state);

    if config.site.content_encoding {
        router = router.layer(CompressionLayer::new().compress_when(compress_always));
    }

    router
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.listener.request_timeout_secs,
        )))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}

/// Serves every path that is not a side channel.
async fn gateway_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let path = percent_decode_str(uri.path()).decode_utf8_lossy();
    state.gateway.handle(&method, &path, &headers).await
}

async fn health_handler(State(state): State<AppState>) -> HealthReport {
    state.health.check().await
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn version_handler() -> String {
    version_string(
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_COMMIT"),
        option_env!("BUILD_DATE"),
    )
}

/// `<version>` or `<version>-<commit> (built at <date>)`.
fn version_string(version: &str, commit: Option<&str>, date: Option<&str>) -> String {
    match (commit, date) {
        (Some(commit), Some(date)) if !commit.is_empty() && !date.is_empty() => {
            format!("{}-{} (built at {})\n", version, commit, date)
        }
        _ => format!("{}\n", version),
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server from assembled state.
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.triggered())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        let triggered = shutdown.triggered();
        tokio::spawn(async move {
            triggered.await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

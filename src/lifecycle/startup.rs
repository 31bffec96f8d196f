//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Bind listeners and begin accepting traffic
//! - Install the signal handler that ends serving
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;

use super::signals::spawn_signal_handler;
use super::Shutdown;
use crate::config::GatewayConfig;
use crate::http::{AppState, HttpServer};
use crate::net::tls::{load_tls_config, TlsError};
use crate::store::{ObjectStore, S3Store};

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the S3 store and serve until a shutdown signal arrives.
pub async fn run(
    config: GatewayConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<(), StartupError> {
    let store: Arc<dyn ObjectStore> = Arc::new(S3Store::new(&config.store));
    tracing::info!(
        bucket = %config.store.bucket,
        region = %config.store.region,
        endpoint = config.store.endpoint.as_deref().unwrap_or("-"),
        "Object store configured"
    );
    serve(config, store, metrics).await
}

/// Serve `store` with the given configuration until shutdown.
pub async fn serve(
    config: GatewayConfig,
    store: Arc<dyn ObjectStore>,
    metrics: Option<PrometheusHandle>,
) -> Result<(), StartupError> {
    let address: SocketAddr = config
        .listener
        .bind_address
        .parse()
        .map_err(|_| StartupError::BindAddress(config.listener.bind_address.clone()))?;
    let tls = config.listener.tls.clone();

    tracing::info!(
        cache_bytes = config.cache.size_bytes,
        listings = config.listing.enabled,
        spa = config.site.spa,
        "Gateway configured"
    );

    let server = HttpServer::new(AppState::new(config, store, metrics));
    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
            server.run_tls(address, rustls, shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(address)
                .await
                .map_err(|source| StartupError::Bind { address, source })?;
            server.run(listener, shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

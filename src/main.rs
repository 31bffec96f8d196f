//! S3 website gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ net (plain / TLS) ──▶ http server ──▶ auth gate ──▶ gateway pipeline
//!                                                                      │
//!                                         resolver ◀──────────────────┤
//!                                         response cache ◀────────────┤
//!                                         object store (S3) ◀─────────┘
//!     Client Response
//!     ◀────────── response headers ◀── listing formatter / object body
//!
//!     Side channels (no auth): health, metrics, version
//! ```

use std::path::PathBuf;

use clap::Parser;

use object_gateway::config::load_config;
use object_gateway::lifecycle::startup;
use object_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "object-gateway")]
#[command(about = "Serve an S3 bucket as a website", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("object-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        request_timeout_secs = config.listener.request_timeout_secs,
        "Configuration loaded"
    );

    let handle = if object_gateway::config::path_enabled(&config.observability.metrics_path) {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    startup::run(config, handle).await?;
    Ok(())
}

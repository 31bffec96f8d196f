//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Emit the per-request access log
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and environment (`RUST_LOG` wins)

use std::net::IpAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Target of access log events.
pub const ACCESS_TARGET: &str = "access";

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "object_gateway={level},tower_http={level},{access}=info",
            level = config.log_level,
            access = ACCESS_TARGET,
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// One served request, as written to the access log.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub host: String,
    pub client_ip: Option<IpAddr>,
    pub identity: String,
    pub method: String,
    pub uri: String,
    pub protocol: String,
    pub status: u16,
    pub size: Option<u64>,
    pub referer: String,
    pub user_agent: String,
    pub elapsed: Duration,
}

impl AccessRecord {
    pub fn emit(&self) {
        let ip = self
            .client_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string());
        let size = self.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());

        tracing::info!(
            target: ACCESS_TARGET,
            host = %self.host,
            ip = %ip,
            user = %self.identity,
            method = %self.method,
            uri = %self.uri,
            proto = %self.protocol,
            status = self.status,
            size = %size,
            referer = %self.referer,
            user_agent = %self.user_agent,
            elapsed = format_args!("{:.3}", self.elapsed.as_secs_f64()),
            "{} {} - {} \"{} {} {}\" {} {}",
            self.host,
            ip,
            self.identity,
            self.method,
            self.uri,
            self.protocol,
            self.status,
            size,
        );
    }
}

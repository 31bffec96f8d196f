//! Store reachability check.
//!
//! # Data Flow
//! ```text
//! GET <health path>
//!     → HealthProbe::check (store get of the health key)
//!     → NoSuchKey counts as healthy: the bucket answered
//!     → JSON report, 200 healthy / 500 unhealthy
//! ```
//!
//! # Design Decisions
//! - Reachability, not existence, is what is being tested
//! - Bypasses the auth gate and the response cache

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::observability::metrics::{self, StoreAction};
use crate::store::{ObjectStore, StoreError};

const SOURCE: &str = "healthcheck";

/// Outcome for one dependency.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub healthy: bool,
    pub time_ns: u64,
    /// Elapsed milliseconds.
    pub time_human: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub bucket: ProbeResult,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.bucket.healthy
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        let status = if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

/// Probes the store by reading a fixed key.
pub struct HealthProbe {
    store: Arc<dyn ObjectStore>,
    key: String,
}

impl HealthProbe {
    pub fn new(store: Arc<dyn ObjectStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub async fn check(&self) -> HealthReport {
        let start = Instant::now();
        let result = self.store.get(&self.key, None).await;
        let elapsed = start.elapsed();

        let code = match &result {
            Ok(_) => "OK",
            Err(e) => e.code(),
        };
        metrics::record_store_request(StoreAction::Get, code, SOURCE);

        let error = match result {
            Ok(_) | Err(StoreError::NotFound(_)) => None,
            Err(e) => Some(e.to_string()),
        };
        let healthy = error.is_none();
        metrics::record_healthcheck(healthy);
        if let Some(error) = &error {
            tracing::warn!(key = %self.key, error = %error, "health check failed");
        }

        HealthReport {
            bucket: ProbeResult {
                healthy,
                time_ns: duration_nanos(elapsed),
                time_human: elapsed.as_millis() as u64,
                error,
            },
        }
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

//! S3 website gateway library.
//!
//! Serves a bucket as a website: path resolution, index documents, directory
//! listings, an in-memory response cache, access control and side-channel
//! endpoints (health, metrics, version).

// Core subsystems
pub mod config;
pub mod gateway;
pub mod http;
pub mod net;
pub mod store;

// Request-path components
pub mod cache;
pub mod error;
pub mod listing;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use http::{build_router, AppState, HttpServer};
pub use lifecycle::Shutdown;

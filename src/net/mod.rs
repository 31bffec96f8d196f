//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → plain: tokio listener served by axum
//!     → TLS: tls.rs (PEM checks, rustls config) served by axum-server
//!     → Hand off to HTTP layer
//! ```

pub mod tls;

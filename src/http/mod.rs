//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, side channels, middleware stack)
//!     → request.rs (request id, tracing span)
//!     → middleware/ (access log, auth gate, CORS)
//!     → gateway pipeline (resolve, cache, store)
//!     → response.rs (object metadata → headers)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer};

//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → ip_allow.rs (resolve client address, check allow-list)
//!     → cors.rs (response headers, never rejects)
//!     → basic.rs (Basic credential pairs)
//!     → jwt.rs (bearer token, identity claim)
//!     → gate.rs (composes the above, yields Identity or 401)
//! ```
//!
//! # Design Decisions
//! - Fixed precedence: the first failing check decides the response
//! - Fail closed: a configured check with missing input rejects
//! - All failures look the same to the client (401 + WWW-Authenticate)

pub mod basic;
pub mod cors;
pub mod gate;
pub mod ip_allow;
pub mod jwt;

pub use gate::{AuthGate, AuthRejection, Identity};

//! Request middleware run in front of the gateway handler.

pub mod access_control;
pub mod access_log;

pub use access_control::access_control_middleware;
pub use access_log::access_log_middleware;

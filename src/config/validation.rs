//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required values present (bucket, index document)
//! - Values that are parsed later must parse now (addresses, ranges, header names)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::{path_enabled, GatewayConfig};
use crate::security::ip_allow::parse_ip_range;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.store.bucket.trim().is_empty() {
        errors.push(ValidationError::new("store.bucket", "bucket name is required"));
    }
    if config.site.index_document.trim().is_empty() {
        errors.push(ValidationError::new("site.index_document", "must not be empty"));
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "both cert_path and key_path are required",
            ));
        }
    }

    for range in &config.auth.allow_ip_ranges {
        if let Err(e) = parse_ip_range(range) {
            errors.push(ValidationError::new(
                "auth.allow_ip_ranges",
                format!("invalid IP range '{}': {}", range, e),
            ));
        }
    }

    let headers = [
        ("auth.forwarded_for", &config.auth.forwarded_for),
        ("auth.username_header", &config.auth.username_header),
        ("auth.jwt_header", &config.auth.jwt_header),
    ];
    for (field, value) in headers {
        if let Some(name) = value.as_deref().filter(|v| !v.is_empty()) {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                errors.push(ValidationError::new(field, format!("'{}' is not a header name", name)));
            }
        }
    }

    let obs = &config.observability;
    let side_channels = [
        ("observability.health_check_path", &obs.health_check_path),
        ("observability.metrics_path", &obs.metrics_path),
        ("observability.version_path", &obs.version_path),
    ];
    let mut seen: Vec<&str> = Vec::new();
    for (field, path) in side_channels {
        if !path_enabled(path) {
            continue;
        }
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, format!("'{}' must start with '/'", path)));
        } else if seen.contains(&path.as_str()) {
            errors.push(ValidationError::new(field, format!("'{}' is already in use", path)));
        }
        seen.push(path);
    }

    if config.auth.basic.iter().any(|c| c.username.is_empty()) {
        errors.push(ValidationError::new("auth.basic", "usernames must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.store.bucket = "site-bucket".into();
        config
    }

    #[test]
    fn test_default_with_bucket_is_valid() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.auth.allow_ip_ranges = vec!["10.0.0.0/8".into(), "not-an-ip".into()];
        config.auth.forwarded_for = Some("bad header".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["store.bucket", "auth.allow_ip_ranges", "auth.forwarded_for"]);
    }

    #[test]
    fn test_side_channel_paths() {
        let mut config = valid();
        config.observability.health_check_path = "/status".into();
        config.observability.metrics_path = "/status".into();
        config.observability.version_path = "version".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["observability.metrics_path", "observability.version_path"]);

        // "/" alone means disabled
        config.observability.metrics_path = "/".into();
        config.observability.version_path = String::new();
        assert!(validate_config(&config).is_ok());
    }
}

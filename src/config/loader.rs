//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{BasicCredential, GatewayConfig, SortDirection, TlsConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Boolean parsing with the spellings accepted by Go's `strconv.ParseBool`.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_direction(value: &str) -> Option<SortDirection> {
    match value.to_ascii_lowercase().as_str() {
        "asc" => Some(SortDirection::Asc),
        "desc" => Some(SortDirection::Desc),
        _ => None,
    }
}

/// Overlay the deployment environment variables onto `config`.
///
/// Unset or empty variables leave the current value alone; unparseable values
/// are ignored with a warning.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let flag = |key: &str, target: &mut bool| {
        if let Some(raw) = var(key) {
            match parse_bool(&raw) {
                Some(b) => *target = b,
                None => tracing::warn!(variable = key, value = %raw, "Ignoring unparseable boolean"),
            }
        }
    };
    let number = |key: &str, target: &mut u64| {
        if let Some(raw) = var(key) {
            match raw.trim().parse() {
                Ok(n) => *target = n,
                Err(_) => tracing::warn!(variable = key, value = %raw, "Ignoring unparseable number"),
            }
        }
    };

    // Store
    if let Some(region) = var("AWS_REGION").or_else(|| var("AWS_DEFAULT_REGION")) {
        config.store.region = region;
    }
    if let Some(endpoint) = var("AWS_API_ENDPOINT") {
        config.store.endpoint = Some(endpoint);
    }
    if let Some(bucket) = var("AWS_S3_BUCKET") {
        config.store.bucket = bucket;
    }
    if let Some(prefix) = var("AWS_S3_KEY_PREFIX") {
        config.store.key_prefix = prefix;
    }
    flag("GET_ALL_PAGES_IN_DIR", &mut config.store.list_all_pages);
    flag("INSECURE_TLS", &mut config.store.insecure_tls);
    let mut idle = config.store.max_idle_connections as u64;
    number("MAX_IDLE_CONNECTIONS", &mut idle);
    config.store.max_idle_connections = idle as usize;
    number("IDLE_CONNECTION_TIMEOUT", &mut config.store.idle_connection_timeout_secs);

    // Listener
    let host = var("APP_HOST");
    let port = var("APP_PORT");
    if host.is_some() || port.is_some() {
        let host = host.unwrap_or_else(|| "0.0.0.0".to_string());
        let port = port.unwrap_or_else(|| "80".to_string());
        config.listener.bind_address = if host.contains(':') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        };
    }
    if let (Some(cert_path), Some(key_path)) = (var("SSL_CERT_PATH"), var("SSL_KEY_PATH")) {
        config.listener.tls = Some(TlsConfig { cert_path, key_path });
    }

    // Site
    if let Some(index) = var("INDEX_DOCUMENT") {
        config.site.index_document = index;
    }
    if let Some(strip) = var("STRIP_PATH") {
        config.site.strip_path = strip;
    }
    flag("SPA", &mut config.site.spa);
    flag("CONTENT_ENCODING", &mut config.site.content_encoding);
    for (key, target) in [
        ("HTTP_CACHE_CONTROL", &mut config.site.cache_control),
        ("HTTP_EXPIRES", &mut config.site.expires),
        ("CONTENT_TYPE", &mut config.site.content_type),
        ("CONTENT_DISPOSITION", &mut config.site.content_disposition),
    ] {
        if let Some(value) = var(key) {
            *target = Some(value);
        }
    }

    // Listing
    flag("DIRECTORY_LISTINGS", &mut config.listing.enabled);
    flag("DIRECTORY_LISTINGS_CHECK_INDEX", &mut config.listing.check_index);
    if let Some(raw) = var("DIRECTORY_LISTINGS_FORMAT") {
        match raw.parse() {
            Ok(format) => config.listing.format = format,
            Err(e) => tracing::warn!(error = %e, "Ignoring DIRECTORY_LISTINGS_FORMAT"),
        }
    }
    if let Some(direction) = var("SORT_DATE").as_deref().and_then(parse_direction) {
        config.listing.sort_date = Some(direction);
    }
    if let Some(direction) = var("SORT_FILE").as_deref().and_then(parse_direction) {
        config.listing.sort_name = direction;
    }
    flag("SORT_NUMERIC", &mut config.listing.sort_numeric);

    // Cache
    number("CACHE_SIZE", &mut config.cache.size_bytes);
    number("CACHE_TTL", &mut config.cache.ttl_secs);
    number("CACHE_MAX_FILE_SIZE", &mut config.cache.max_object_bytes);

    // CORS
    for (key, target) in [
        ("CORS_ALLOW_ORIGIN", &mut config.cors.allow_origin),
        ("CORS_ALLOW_METHODS", &mut config.cors.allow_methods),
        ("CORS_ALLOW_HEADERS", &mut config.cors.allow_headers),
    ] {
        if let Some(value) = var(key) {
            *target = value;
        }
    }
    if let Some(raw) = var("CORS_MAX_AGE") {
        if let Ok(age) = raw.trim().parse() {
            config.cors.max_age = age;
        }
    }

    // Auth
    if let Some(ranges) = var("WHITELIST_IP_RANGES") {
        config.auth.allow_ip_ranges = ranges
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
    }
    for (key, target) in [
        ("FORWARDED_FOR", &mut config.auth.forwarded_for),
        ("USERNAME_HEADER", &mut config.auth.username_header),
        ("JWT_SECRET_KEY", &mut config.auth.jwt_secret),
        ("JWT_HEADER", &mut config.auth.jwt_header),
        ("JWT_USER_FIELD", &mut config.auth.jwt_user_field),
    ] {
        if let Some(value) = var(key) {
            *target = Some(value);
        }
    }
    if let (Some(users), Some(passwords)) = (var("BASIC_AUTH_USER"), var("BASIC_AUTH_PASS")) {
        config.auth.basic = users
            .split(' ')
            .zip(passwords.split(' '))
            .map(|(username, password)| BasicCredential {
                username: username.to_string(),
                password: password.to_string(),
            })
            .collect();
    }

    // Observability
    flag("ACCESS_LOG", &mut config.observability.access_log);
    for (key, target) in [
        ("HEALTHCHECK_PATH", &mut config.observability.health_check_path),
        ("METRICS_PATH", &mut config.observability.metrics_path),
        ("VERSION_PATH", &mut config.observability.version_path),
    ] {
        if let Some(value) = var(key) {
            *target = value;
        }
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS, timeouts).
    pub listener: ListenerConfig,

    /// Bucket and client settings.
    pub store: StoreConfig,

    /// How paths map to objects and how responses are shaped.
    pub site: SiteConfig,

    /// Directory listing settings.
    pub listing: ListingConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// CORS response headers.
    pub cors: CorsConfig,

    /// Access control.
    pub auth: AuthConfig,

    /// Logging and side-channel endpoints.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:80").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
            tls: None,
            request_timeout_secs: 60,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Object store (bucket) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bucket name. Required.
    pub bucket: String,

    /// Prefix prepended to every object key.
    pub key_prefix: String,

    pub region: String,

    /// Custom endpoint (S3-compatible services); switches to path-style requests.
    pub endpoint: Option<String>,

    /// Accept invalid TLS certificates from the endpoint.
    pub insecure_tls: bool,

    /// Idle connections kept per host.
    pub max_idle_connections: usize,

    /// Idle connection timeout in seconds.
    pub idle_connection_timeout_secs: u64,

    /// Return every page of a listing instead of the first one.
    pub list_all_pages: bool,

    /// Upper bound on rebuilding the client session, in seconds.
    pub session_refresh_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            key_prefix: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            insecure_tls: false,
            max_idle_connections: 150,
            idle_connection_timeout_secs: 10,
            list_all_pages: false,
            session_refresh_timeout_secs: 10,
        }
    }
}

/// Site behaviour and response header overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Document served for paths ending in `/`.
    pub index_document: String,

    /// Prefix removed from request paths before lookup.
    pub strip_path: String,

    /// Fall back to the directory index document on 404/403.
    pub spa: bool,

    /// Compress responses (gzip/deflate) when the client accepts it.
    pub content_encoding: bool,

    pub cache_control: Option<String>,
    pub expires: Option<String>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index_document: "index.html".to_string(),
            strip_path: String::new(),
            spa: false,
            content_encoding: true,
            cache_control: None,
            expires: None,
            content_type: None,
            content_disposition: None,
        }
    }
}

/// Rendering of directory listings.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingFormat {
    /// JSON array of entries.
    #[default]
    Json,
    /// Unordered list with timestamps.
    Html,
    /// Bare anchors.
    Shtml,
    /// `mod_autoindex` style table.
    Apache,
}

impl std::str::FromStr for ListingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "json" => Ok(ListingFormat::Json),
            "html" => Ok(ListingFormat::Html),
            "shtml" => Ok(ListingFormat::Shtml),
            "apache" => Ok(ListingFormat::Apache),
            other => Err(format!("unknown listing format '{}'", other)),
        }
    }
}

/// Direction of a sort key.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Directory listing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ListingConfig {
    /// Render listings for paths ending in `/`.
    pub enabled: bool,

    pub format: ListingFormat,

    /// Serve the index document instead of a listing when it exists.
    pub check_index: bool,

    /// Order plain entries by timestamp first.
    pub sort_date: Option<SortDirection>,

    /// Name order.
    pub sort_name: SortDirection,

    /// Shorter names sort first regardless of characters.
    pub sort_numeric: bool,
}

/// Response cache configuration. A zero size or TTL disables caching.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total body bytes kept in memory.
    pub size_bytes: u64,

    pub ttl_secs: u64,

    /// Objects with a larger declared length are never cached.
    pub max_object_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: 0,
            ttl_secs: 300,
            max_object_bytes: 1024 * 1024,
        }
    }
}

/// CORS headers, emitted only when all four values are set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
    pub max_age: i64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: String::new(),
            allow_methods: String::new(),
            allow_headers: String::new(),
            max_age: 600,
        }
    }
}

/// A username/password pair accepted by Basic auth.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BasicCredential {
    pub username: String,
    pub password: String,
}

/// Access control configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Allowed client ranges (CIDR or single address). Empty allows everyone.
    pub allow_ip_ranges: Vec<String>,

    /// Trusted header carrying the client address (e.g., "X-Forwarded-For").
    pub forwarded_for: Option<String>,

    /// Trusted header carrying the requester identity, used for logging.
    pub username_header: Option<String>,

    /// Accepted Basic credentials. Empty disables Basic auth.
    pub basic: Vec<BasicCredential>,

    /// HMAC secret for bearer tokens.
    pub jwt_secret: Option<String>,

    /// Header carrying the raw token instead of `Authorization: Bearer`.
    pub jwt_header: Option<String>,

    /// Claim copied into the requester identity.
    pub jwt_user_field: Option<String>,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Emit one access log event per request.
    pub access_log: bool,

    /// Prometheus scrape path. Disabled when empty.
    pub metrics_path: String,

    /// Health check path. Disabled when empty.
    pub health_check_path: String,

    /// Key probed by the health check; defaults to the health check path.
    pub health_check_key: Option<String>,

    /// Version path. Disabled when empty.
    pub version_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            access_log: false,
            metrics_path: String::new(),
            health_check_path: String::new(),
            health_check_key: None,
            version_path: String::new(),
        }
    }
}

impl ObservabilityConfig {
    /// Store key read by the health check.
    pub fn health_key(&self) -> &str {
        self.health_check_key
            .as_deref()
            .unwrap_or(&self.health_check_path)
    }
}

/// A side-channel path counts as configured when it is longer than `/`.
pub fn path_enabled(path: &str) -> bool {
    path.len() > 1
}

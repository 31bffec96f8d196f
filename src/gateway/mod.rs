//! The request pipeline.
//!
//! # Data Flow
//! ```text
//! GET/HEAD (already past the auth gate)
//!     → resolver.rs (collapse slashes, strip prefix, symlink, index/listing)
//!     → pipeline.rs
//!         listing → cache ⟷ store.list → listing formatter
//!         object  → cache ⟷ store.get/head → SPA fallback
//!     → http/response.rs (metadata → headers, body)
//! ```
//!
//! # Design Decisions
//! - The store and the cache are injected, never global, so tests substitute
//!   an in-memory store and a fresh cache
//! - Cached bodies are stored uncompressed; compression happens on the way out
//! - Every store call is counted by action and outcome

pub mod pipeline;
pub mod resolver;

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::{GatewayConfig, ListingConfig, SiteConfig};
use crate::listing::SortPolicy;
use crate::observability::metrics::{self, StoreAction};
use crate::store::{normalize_key, ObjectStore, StoreError};

pub use resolver::Resolution;

/// `source` label for store calls made while serving requests.
const SOURCE: &str = "proxy";

/// Serves objects and listings from one bucket.
pub struct Gateway {
    store: Arc<dyn ObjectStore>,
    cache: Arc<ResponseCache>,
    bucket: String,
    key_prefix: String,
    site: SiteConfig,
    listing: ListingConfig,
    sort: SortPolicy,
}

impl Gateway {
    pub fn new(config: &GatewayConfig, store: Arc<dyn ObjectStore>, cache: Arc<ResponseCache>) -> Self {
        Self {
            store,
            cache,
            bucket: config.store.bucket.clone(),
            key_prefix: config.store.key_prefix.clone(),
            site: config.site.clone(),
            listing: config.listing.clone(),
            sort: SortPolicy::from_config(&config.listing),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Store key for a logical path.
    fn store_key(&self, path: &str) -> String {
        normalize_key(&format!("{}{}", self.key_prefix, path)).to_string()
    }
}

fn record<T>(action: StoreAction, result: &Result<T, StoreError>) {
    let code = match result {
        Ok(_) => "OK",
        Err(e) => e.code(),
    };
    metrics::record_store_request(action, code, SOURCE);
}

//! Path resolution.
//!
//! Turns a request path into either an object path or a listing prefix:
//! collapse repeated slashes, strip the configured prefix, follow a symlink
//! document, then resolve a trailing `/` to the index document or a listing.

use serde::Deserialize;

use super::{record, Gateway};
use crate::cache::{probe_key, CacheEntry};
use crate::error::GatewayError;
use crate::observability::metrics::StoreAction;

/// Path segment marking a symlink document.
pub const SYMLINK_MARKER: &str = "symlink.json";

/// What a request path refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A directory listing for this path (ends in `/`).
    Listing(String),
    /// A single object.
    Object(String),
}

#[derive(Debug, Deserialize)]
struct SymlinkDocument {
    #[serde(rename = "URL", alias = "url")]
    url: String,
}

/// Collapse runs of `/` into one.
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(c);
    }
    out
}

/// Remove `prefix` from the front of `path` when present.
pub fn strip_path<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    path.strip_prefix(prefix).unwrap_or(path)
}

/// Sibling index document of `path`: everything up to the last `/`, then `index`.
pub fn fallback_path(path: &str, index: &str) -> String {
    match path.rfind('/') {
        Some(idx) => format!("{}{}", &path[..=idx], index),
        None => format!("/{}", index),
    }
}

/// Whether the last segment of `path` already is the index document.
pub fn is_index(path: &str, index: &str) -> bool {
    path.rsplit('/').next() == Some(index)
}

impl Gateway {
    /// Resolve a raw request path.
    pub async fn resolve(&self, raw_path: &str) -> Result<Resolution, GatewayError> {
        let collapsed = collapse_slashes(raw_path);
        let mut path = strip_path(&collapsed, &self.site.strip_path).to_string();
        if path.is_empty() {
            path.push('/');
        }

        if let Some(idx) = path.find(SYMLINK_MARKER) {
            let end = idx + SYMLINK_MARKER.len();
            let target = self.follow_symlink(&path[..end]).await?;
            tracing::debug!(from = %path, to = %target, "following symlink");
            path = format!("{}{}", target, &path[end..]);
        }

        if path.ends_with('/') {
            if self.listing.enabled {
                let index = format!("{}{}", path, self.site.index_document);
                if !self.listing.check_index || !self.index_exists(&index).await {
                    return Ok(Resolution::Listing(path));
                }
            }
            path.push_str(&self.site.index_document);
        }

        Ok(Resolution::Object(path))
    }

    async fn follow_symlink(&self, path: &str) -> Result<String, GatewayError> {
        let key = self.store_key(path);
        let result = self.store.get(&key, None).await;
        record(StoreAction::Get, &result);

        let body = result?.body.collect().await?;
        let document: SymlinkDocument = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Symlink(format!("{}: {}", key, e)))?;
        Ok(document.url)
    }

    /// Existence probe for an index document, cached like any other response.
    async fn index_exists(&self, path: &str) -> bool {
        let key = self.store_key(path);
        let cache_key = probe_key(&self.bucket, &key);
        if let Some(entry) = self.cache.lookup(&cache_key) {
            return entry.exists;
        }

        let exists = self.store.exists(&key).await;
        self.cache
            .populate(cache_key, CacheEntry::probe(exists, self.cache.ttl()));
        exists
    }
}

//! In-memory response cache.
//!
//! # Responsibilities
//! - Hold fetched object bodies, rendered listings and index existence probes
//! - Bound memory by total body bytes (least recently used goes first)
//! - Expire entries after their TTL
//!
//! # Design Decisions
//! - Entries are immutable `Arc`s; repopulating a key replaces the entry
//! - No single-flight: racing misses may each fetch, the last populate wins
//! - A single mutex guards the LRU because every lookup mutates recency
//! - Expiry uses `tokio::time::Instant` so tests can drive the clock

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::store::ObjectMetadata;

/// Fixed per-entry overhead charged against the size budget.
const ENTRY_OVERHEAD: u64 = 64;

/// A cached response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub metadata: ObjectMetadata,
    pub body: Bytes,
    /// Result of an index existence probe; `true` for ordinary entries.
    pub exists: bool,
    expires_at: Instant,
}

impl CacheEntry {
    /// Entry holding a response body.
    pub fn response(metadata: ObjectMetadata, body: Bytes, ttl: Duration) -> Self {
        Self {
            metadata,
            body,
            exists: true,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Entry recording whether an index document exists.
    pub fn probe(exists: bool, ttl: Duration) -> Self {
        Self {
            metadata: ObjectMetadata::default(),
            body: Bytes::new(),
            exists,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    fn charge(&self, key: &str) -> u64 {
        self.body.len() as u64 + key.len() as u64 + ENTRY_OVERHEAD
    }
}

/// Cache key of a fetched object.
pub fn object_key(bucket: &str, key: &str) -> String {
    format!("get:{}/{}", bucket, key)
}

/// Cache key of a rendered listing.
pub fn listing_key(bucket: &str, prefix: &str) -> String {
    format!("list:{}/{}", bucket, prefix)
}

/// Cache key of an index existence probe.
pub fn probe_key(bucket: &str, key: &str) -> String {
    format!("exists:{}/{}", bucket, key)
}

struct Inner {
    entries: LruCache<String, Arc<CacheEntry>>,
    used: u64,
}

/// Size and TTL bounded response cache shared by every request.
pub struct ResponseCache {
    inner: Option<Mutex<Inner>>,
    capacity: u64,
    ttl: Duration,
    max_object_bytes: u64,
}

impl ResponseCache {
    /// A zero size or TTL yields a cache that never stores anything.
    pub fn new(config: &CacheConfig) -> Self {
        let enabled = config.size_bytes > 0 && config.ttl_secs > 0;
        Self {
            inner: enabled.then(|| {
                Mutex::new(Inner {
                    entries: LruCache::unbounded(),
                    used: 0,
                })
            }),
            capacity: config.size_bytes,
            ttl: Duration::from_secs(config.ttl_secs),
            max_object_bytes: config.max_object_bytes,
        }
    }

    pub fn disabled() -> Self {
        Self::new(&CacheConfig {
            size_bytes: 0,
            ..Default::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Whether a response may be stored: no range requested and small enough.
    pub fn admits(&self, ranged: bool, content_length: u64) -> bool {
        self.is_enabled() && !ranged && content_length <= self.max_object_bytes
    }

    /// Configured TTL, shortened by an upstream `max-age` directive.
    pub fn ttl_for(&self, cache_control: Option<&str>) -> Duration {
        match cache_control.and_then(max_age) {
            Some(max_age) => self.ttl.min(max_age),
            None => self.ttl,
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live entry for `key`, marking it most recently used.
    pub fn lookup(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let mut inner = self.inner.as_ref()?.lock();
        let entry = inner.entries.get(key)?.clone();
        if entry.is_expired(Instant::now()) {
            if let Some(stale) = inner.entries.pop(key) {
                inner.used -= stale.charge(key);
            }
            return None;
        }
        Some(entry)
    }

    /// Store `entry` under `key`, replacing any previous entry.
    pub fn populate(&self, key: String, entry: CacheEntry) {
        let Some(inner) = &self.inner else {
            return;
        };
        let charge = entry.charge(&key);
        if charge > self.capacity {
            return;
        }

        let mut inner = inner.lock();
        if let Some(previous) = inner.entries.pop(&key) {
            inner.used -= previous.charge(&key);
        }
        inner.used += charge;
        inner.entries.put(key, Arc::new(entry));

        while inner.used > self.capacity {
            match inner.entries.pop_lru() {
                Some((evicted_key, evicted)) => {
                    inner.used -= evicted.charge(&evicted_key);
                    tracing::trace!(key = %evicted_key, "cache entry evicted");
                }
                None => break,
            }
        }
    }

    /// Bytes currently charged against the budget.
    pub fn used_bytes(&self) -> u64 {
        self.inner.as_ref().map(|i| i.lock().used).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map(|i| i.lock().entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `max-age` of a `Cache-Control` value, if present and numeric.
fn max_age(cache_control: &str) -> Option<Duration> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        value.trim().trim_matches('"').parse().ok().map(Duration::from_secs)
    })
}

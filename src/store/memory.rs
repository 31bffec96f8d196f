//! In-process object store.
//!
//! Backs every test that needs a store.
//! Each operation is counted so callers can assert how often the store was
//! actually reached (cache hits never touch it).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{
    normalize_key, ByteRange, ObjectBody, ObjectHandle, ObjectMetadata, ObjectStore, StoreEntry,
    StoreError,
};

/// An object held by [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl MemoryObject {
    /// Object with a body and content type, everything else unset.
    pub fn new(body: impl Into<Bytes>, content_type: &str) -> Self {
        Self {
            body: body.into(),
            content_type: Some(content_type.to_string()),
            ..Default::default()
        }
    }

    pub fn with_cache_control(mut self, value: &str) -> Self {
        self.cache_control = Some(value.to_string());
        self
    }

    fn metadata(&self, range: Option<&ByteRange>) -> Result<(ObjectMetadata, Bytes), StoreError> {
        let size = self.body.len() as u64;
        let (body, content_range) = match range {
            Some(range) => {
                let resolved = range
                    .resolve(size)
                    .ok_or_else(|| StoreError::InvalidRange(range.to_string()))?;
                let content_range = ByteRange::content_range(&resolved, size);
                (
                    self.body.slice(resolved.start as usize..resolved.end as usize),
                    Some(content_range),
                )
            }
            None => (self.body.clone(), None),
        };

        let metadata = ObjectMetadata {
            content_length: body.len() as u64,
            content_type: self.content_type.clone(),
            content_encoding: self.content_encoding.clone(),
            content_language: None,
            content_disposition: self.content_disposition.clone(),
            cache_control: self.cache_control.clone(),
            expires: self.expires.clone(),
            etag: self.etag.clone(),
            last_modified: self.last_modified,
            content_range,
            location: self.location.clone(),
        };
        Ok((metadata, body))
    }
}

/// Call counters, one per store operation.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub get: AtomicUsize,
    pub head: AtomicUsize,
    pub list: AtomicUsize,
}

/// Thread-safe in-memory store keyed by object key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, MemoryObject>>,
    denied: RwLock<BTreeSet<String>>,
    calls: CallCounts,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn put(&self, key: &str, object: MemoryObject) {
        self.objects
            .write()
            .insert(normalize_key(key).to_string(), object);
    }

    /// Make every read of `key` fail with `AccessDenied`.
    pub fn deny(&self, key: &str) {
        self.denied.write().insert(normalize_key(key).to_string());
    }

    pub fn gets(&self) -> usize {
        self.calls.get.load(Ordering::SeqCst)
    }

    pub fn heads(&self) -> usize {
        self.calls.head.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }

    fn lookup(&self, key: &str) -> Result<MemoryObject, StoreError> {
        let key = normalize_key(key);
        if self.denied.read().contains(key) {
            return Err(StoreError::AccessDenied(key.to_string()));
        }
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str, range: Option<&ByteRange>) -> Result<ObjectHandle, StoreError> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        let (metadata, body) = self.lookup(key)?.metadata(range)?;
        Ok(ObjectHandle {
            metadata,
            body: ObjectBody::Buffered(body),
        })
    }

    async fn head(&self, key: &str, range: Option<&ByteRange>) -> Result<ObjectMetadata, StoreError> {
        self.calls.head.fetch_add(1, Ordering::SeqCst);
        let (metadata, _) = self.lookup(key)?.metadata(range)?;
        Ok(metadata)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>, StoreError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        let prefix = normalize_key(prefix);
        let objects = self.objects.read();

        let mut prefixes = BTreeSet::new();
        let mut entries = Vec::new();
        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            match rest.find('/') {
                Some(idx) => {
                    prefixes.insert(format!("{}{}", prefix, &rest[..=idx]));
                }
                None => entries.push(StoreEntry::Object {
                    key: key.clone(),
                    size: object.body.len() as u64,
                    last_modified: object.last_modified.unwrap_or_default(),
                }),
            }
        }

        let mut listing: Vec<StoreEntry> = prefixes.into_iter().map(StoreEntry::Prefix).collect();
        listing.extend(entries);
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_groups_common_prefixes() {
        let store = MemoryStore::new();
        store.put("site/a.txt", MemoryObject::new("a", "text/plain"));
        store.put("site/docs/one.txt", MemoryObject::new("1", "text/plain"));
        store.put("site/docs/two.txt", MemoryObject::new("2", "text/plain"));
        store.put("other/b.txt", MemoryObject::new("b", "text/plain"));

        let listing = store.list("/site/").await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0], StoreEntry::Prefix("site/docs/".into()));
        assert!(matches!(&listing[1], StoreEntry::Object { key, size: 1, .. } if key == "site/a.txt"));
        assert_eq!(store.lists(), 1);
    }

    #[tokio::test]
    async fn test_range_and_errors() {
        let store = MemoryStore::new();
        store.put("f.bin", MemoryObject::new("0123456789", "application/octet-stream"));
        store.deny("secret");

        let range = ByteRange::Bounded { start: 2, end: 4 };
        let handle = store.get("/f.bin", Some(&range)).await.unwrap();
        assert_eq!(handle.metadata.content_length, 3);
        assert_eq!(handle.metadata.content_range.as_deref(), Some("bytes 2-4/10"));
        assert_eq!(handle.body.collect().await.unwrap(), Bytes::from_static(b"234"));

        assert!(matches!(store.get("missing", None).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.head("secret", None).await, Err(StoreError::AccessDenied(_))));
        let bad = ByteRange::From(50);
        assert!(matches!(store.get("f.bin", Some(&bad)).await, Err(StoreError::InvalidRange(_))));
        assert!(store.exists("f.bin").await);
        assert!(!store.exists("missing").await);
    }
}

//! Object store abstraction.
//!
//! # Data Flow
//! ```text
//! pipeline / resolver / health probe
//!     → ObjectStore trait (get, head, exists, list)
//!     → s3.rs (object_store AWS client behind a session cache)
//!       or memory.rs (in-process map, used by tests and local runs)
//! ```
//!
//! # Design Decisions
//! - One metadata type for every operation (get, head, cache hit), so header
//!   translation never cares where the metadata came from
//! - Keys are passed without a leading `/`; adapters trim it defensively
//! - Errors are classified once, here, into the handful of kinds the
//!   pipeline maps to HTTP statuses

pub mod memory;
pub mod range;
pub mod s3;
pub mod session;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;

pub use memory::MemoryStore;
pub use range::ByteRange;
pub use s3::S3Store;

/// Errors surfaced by an object store adapter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Missing key or bucket.
    #[error("NoSuchKey: {0}")]
    NotFound(String),

    /// The store refused the request.
    #[error("AccessDenied: {0}")]
    AccessDenied(String),

    /// The requested byte range cannot be satisfied.
    #[error("InvalidRange: {0}")]
    InvalidRange(String),

    /// The store (or a session refresh) did not answer in time.
    #[error("store request timed out: {0}")]
    Timeout(String),

    /// Any other transport or service failure.
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Short error code used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "NoSuchKey",
            StoreError::AccessDenied(_) => "AccessDenied",
            StoreError::InvalidRange(_) => "InvalidRange",
            StoreError::Timeout(_) => "Timeout",
            StoreError::Backend(_) => "UnknownError",
        }
    }

    /// Whether the single-page-application fallback may replace this error.
    pub fn is_not_found_or_forbidden(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::AccessDenied(_))
    }
}

/// Object metadata, populated by whichever operation produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Length of the body that will be delivered (the range length for partial reads).
    pub content_length: u64,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
    pub content_disposition: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_range: Option<String>,
    /// Redirect location attached to the object (website redirects).
    pub location: Option<String>,
}

/// Body of a fetched object.
pub enum ObjectBody {
    /// Fully buffered bytes.
    Buffered(Bytes),
    /// Streamed chunks straight from the store.
    Stream(BoxStream<'static, Result<Bytes, StoreError>>),
}

impl ObjectBody {
    /// Read the whole body into memory.
    pub async fn collect(self) -> Result<Bytes, StoreError> {
        match self {
            ObjectBody::Buffered(bytes) => Ok(bytes),
            ObjectBody::Stream(stream) => {
                let chunks: Vec<Bytes> = stream.try_collect().await?;
                Ok(Bytes::from(chunks.concat()))
            }
        }
    }
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectBody::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            ObjectBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Result of a successful read.
#[derive(Debug)]
pub struct ObjectHandle {
    pub metadata: ObjectMetadata,
    pub body: ObjectBody,
}

/// One child of a listed prefix, as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEntry {
    /// A common prefix (pseudo-directory), full key including the trailing `/`.
    Prefix(String),
    /// A plain object.
    Object {
        key: String,
        size: u64,
        last_modified: DateTime<Utc>,
    },
}

/// Abstract object store client capability.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, optionally a byte range of it.
    async fn get(&self, key: &str, range: Option<&ByteRange>) -> Result<ObjectHandle, StoreError>;

    /// Fetch object metadata only.
    async fn head(&self, key: &str, range: Option<&ByteRange>) -> Result<ObjectMetadata, StoreError>;

    /// True when the key exists with a non-empty body.
    async fn exists(&self, key: &str) -> bool {
        match self.head(key, None).await {
            Ok(meta) => meta.content_length > 0,
            Err(_) => false,
        }
    }

    /// List the direct children of `prefix`, using `/` as the delimiter.
    async fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>, StoreError>;
}

/// Strip leading slashes the way S3 keys expect.
pub fn normalize_key(key: &str) -> &str {
    key.trim_start_matches('/')
}

//! S3-compatible adapter built on the `object_store` AWS client.
//!
//! # Responsibilities
//! - Build the client from store configuration and ambient AWS credentials
//! - Translate get/head/list into `object_store` calls
//! - Classify client errors into [`StoreError`]
//!
//! Retries, credential refresh and connection pooling stay inside
//! `object_store`; the client itself is rebuilt through [`SessionCache`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ClientOptions, GetOptions, GetRange, ObjectStore as RemoteStore,
};

use super::session::{SessionCache, SessionFactory};
use super::{
    normalize_key, ByteRange, ObjectBody, ObjectHandle, ObjectMetadata, ObjectStore, StoreEntry,
    StoreError,
};
use crate::config::StoreConfig;

/// Entries returned by a single listing page.
const LIST_PAGE_SIZE: usize = 1000;

/// Object store backed by an S3 bucket.
pub struct S3Store {
    session: SessionCache<AmazonS3>,
    list_all_pages: bool,
}

impl S3Store {
    pub fn new(config: &StoreConfig) -> Self {
        let refresh_timeout = Duration::from_secs(config.session_refresh_timeout_secs.max(1));
        let list_all_pages = config.list_all_pages;
        let config = config.clone();
        let factory: SessionFactory<AmazonS3> = Arc::new(move || {
            let config = config.clone();
            Box::pin(async move { build_client(&config) })
        });

        Self {
            session: SessionCache::new(factory, refresh_timeout),
            list_all_pages,
        }
    }
}

fn build_client(config: &StoreConfig) -> Result<AmazonS3, StoreError> {
    let client_options = ClientOptions::new()
        .with_pool_max_idle_per_host(config.max_idle_connections)
        .with_pool_idle_timeout(Duration::from_secs(config.idle_connection_timeout_secs))
        .with_allow_invalid_certificates(config.insecure_tls);

    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(&config.bucket)
        .with_region(&config.region)
        .with_client_options(client_options);

    if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.is_empty()) {
        builder = builder
            .with_endpoint(endpoint)
            .with_virtual_hosted_style_request(false)
            .with_allow_http(endpoint.starts_with("http://"));
    }

    builder
        .build()
        .map_err(|e| StoreError::Backend(format!("failed to build S3 client: {}", e)))
}

fn classify(error: object_store::Error) -> StoreError {
    match error {
        object_store::Error::NotFound { path, .. } => StoreError::NotFound(path),
        object_store::Error::PermissionDenied { path, .. }
        | object_store::Error::Unauthenticated { path, .. } => StoreError::AccessDenied(path),
        other => {
            let message = other.to_string();
            if message.contains("InvalidRange") || message.contains("Range Not Satisfiable") {
                StoreError::InvalidRange(message)
            } else {
                StoreError::Backend(message)
            }
        }
    }
}

fn to_get_range(range: &ByteRange) -> GetRange {
    match *range {
        ByteRange::Bounded { start, end } => {
            let end = usize::try_from(end.saturating_add(1)).unwrap_or(usize::MAX);
            GetRange::Bounded(start as usize..end)
        }
        ByteRange::From(start) => GetRange::Offset(start as usize),
        ByteRange::Suffix(n) => GetRange::Suffix(n as usize),
    }
}

/// Store path for `key`, kept byte for byte.
///
/// `Path::from` would percent-encode characters such as `~` or `[`, which
/// names a different S3 key. Keys that are not valid paths (empty segments,
/// `.` or `..`) cannot exist in the bucket as addressed.
fn object_path(key: &str) -> Result<Path, StoreError> {
    let key = normalize_key(key);
    Path::parse(key).map_err(|e| {
        tracing::debug!(key = %key, error = %e, "key is not a valid store path");
        StoreError::NotFound(key.to_string())
    })
}

fn attribute(attributes: &Attributes, key: &Attribute) -> Option<String> {
    attributes.get(key).map(|v| v.as_ref().to_string())
}

fn metadata_from(
    meta: &object_store::ObjectMeta,
    attributes: &Attributes,
    served: std::ops::Range<usize>,
    ranged: bool,
) -> ObjectMetadata {
    let size = meta.size as u64;
    let served = served.start as u64..served.end as u64;
    ObjectMetadata {
        content_length: served.end - served.start,
        content_type: attribute(attributes, &Attribute::ContentType),
        content_encoding: attribute(attributes, &Attribute::ContentEncoding),
        content_language: attribute(attributes, &Attribute::ContentLanguage),
        content_disposition: attribute(attributes, &Attribute::ContentDisposition),
        cache_control: attribute(attributes, &Attribute::CacheControl),
        expires: None,
        etag: meta.e_tag.clone(),
        last_modified: Some(meta.last_modified),
        content_range: ranged.then(|| ByteRange::content_range(&served, size)),
        location: None,
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str, range: Option<&ByteRange>) -> Result<ObjectHandle, StoreError> {
        let client = self.session.get().await?;
        let options = GetOptions {
            range: range.map(to_get_range),
            ..Default::default()
        };

        let result = client
            .get_opts(&object_path(key)?, options)
            .await
            .map_err(classify)?;

        let metadata = metadata_from(&result.meta, &result.attributes, result.range.clone(), range.is_some());
        let stream = result.into_stream().map_err(classify).boxed();

        Ok(ObjectHandle {
            metadata,
            body: ObjectBody::Stream(stream),
        })
    }

    async fn head(&self, key: &str, range: Option<&ByteRange>) -> Result<ObjectMetadata, StoreError> {
        let client = self.session.get().await?;
        let options = GetOptions {
            head: true,
            ..Default::default()
        };

        let result = client
            .get_opts(&object_path(key)?, options)
            .await
            .map_err(classify)?;

        let size = result.meta.size as u64;
        let served = match range {
            Some(range) => range
                .resolve(size)
                .ok_or_else(|| StoreError::InvalidRange(range.to_string()))?,
            None => 0..size,
        };
        let served = served.start as usize..served.end as usize;
        Ok(metadata_from(&result.meta, &result.attributes, served, false))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let client = self.session.get().await?;
        let path = object_path(prefix)?;
        let path = (!path.as_ref().is_empty()).then_some(path);

        let result = client
            .list_with_delimiter(path.as_ref())
            .await
            .map_err(classify)?;

        let mut entries: Vec<StoreEntry> = result
            .common_prefixes
            .into_iter()
            .map(|p| StoreEntry::Prefix(format!("{}/", p)))
            .chain(result.objects.into_iter().map(|meta| StoreEntry::Object {
                key: meta.location.to_string(),
                size: meta.size as u64,
                last_modified: meta.last_modified,
            }))
            .collect();

        if !self.list_all_pages {
            entries.truncate(LIST_PAGE_SIZE);
        }
        Ok(entries)
    }
}

//! Per-request orchestration: resolve, consult the cache, fetch, fall back.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method};
use axum::response::Response;
use bytes::Bytes;

use super::resolver::{fallback_path, is_index, Resolution};
use super::{record, Gateway};
use crate::cache::{listing_key, object_key, CacheEntry};
use crate::error::GatewayError;
use crate::http::response::{body_from, listing_response, object_response};
use crate::listing::{render, ListingEntry};
use crate::observability::metrics::{self, StoreAction};
use crate::store::{ByteRange, ObjectMetadata};

/// Range requested by the client, if any.
struct RequestedRange {
    /// The client sent a `Range` header, parseable or not.
    present: bool,
    range: Option<ByteRange>,
}

impl RequestedRange {
    fn from_headers(headers: &HeaderMap) -> Self {
        let raw = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
        Self {
            present: raw.is_some(),
            range: raw.and_then(ByteRange::parse),
        }
    }
}

impl Gateway {
    /// Serve one GET or HEAD request for `path`.
    pub async fn handle(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Response, GatewayError> {
        let head = match *method {
            Method::GET => false,
            Method::HEAD => true,
            _ => return Err(GatewayError::MethodNotAllowed),
        };
        let range = RequestedRange::from_headers(headers);

        let path = match self.resolve(path).await? {
            Resolution::Listing(prefix) => return self.listing(&prefix, head).await,
            Resolution::Object(path) => path,
        };

        match self.serve(&path, &range, head).await {
            Err(GatewayError::Store(e))
                if e.is_not_found_or_forbidden()
                    && self.site.spa
                    && !is_index(&path, &self.site.index_document) =>
            {
                let fallback = fallback_path(&path, &self.site.index_document);
                tracing::debug!(path = %path, fallback = %fallback, error = %e, "serving SPA index");
                self.serve(&fallback, &range, head).await
            }
            other => other,
        }
    }

    async fn serve(
        &self,
        path: &str,
        range: &RequestedRange,
        head: bool,
    ) -> Result<Response, GatewayError> {
        let key = self.store_key(path);
        let cache_key = object_key(&self.bucket, &key);

        if !range.present && self.cache.is_enabled() {
            if let Some(entry) = self.cache.lookup(&cache_key) {
                metrics::record_cache_lookup(true);
                tracing::debug!(key = %key, "cache hit");
                let body = Body::from(entry.body.clone());
                return Ok(self.respond(&entry.metadata, body, head));
            }
            metrics::record_cache_lookup(false);
        }

        if head {
            let result = self.store.head(&key, range.range.as_ref()).await;
            record(StoreAction::Head, &result);
            return Ok(self.respond(&result?, Body::empty(), true));
        }

        let result = self.store.get(&key, range.range.as_ref()).await;
        record(StoreAction::Get, &result);
        let handle = result?;

        if !self.cache.admits(range.present, handle.metadata.content_length) {
            return Ok(self.respond(&handle.metadata, body_from(handle.body), false));
        }

        let body = handle.body.collect().await?;
        let ttl = self.cache.ttl_for(handle.metadata.cache_control.as_deref());
        self.cache.populate(
            cache_key,
            CacheEntry::response(handle.metadata.clone(), body.clone(), ttl),
        );
        Ok(self.respond(&handle.metadata, Body::from(body), false))
    }

    fn respond(&self, metadata: &ObjectMetadata, body: Body, head: bool) -> Response {
        object_response(metadata, body, head, &self.site, &self.bucket)
    }

    async fn listing(&self, path: &str, head: bool) -> Result<Response, GatewayError> {
        let prefix = self.store_key(path);
        let cache_key = listing_key(&self.bucket, &prefix);

        if let Some(entry) = self.cache.lookup(&cache_key) {
            metrics::record_cache_lookup(true);
            let content_type = entry.metadata.content_type.as_deref().unwrap_or_default();
            return Ok(listing_response(content_type, entry.body.clone(), head));
        }
        if self.cache.is_enabled() {
            metrics::record_cache_lookup(false);
        }

        let result = self.store.list(&prefix).await;
        record(StoreAction::List, &result);
        let mut entries = ListingEntry::from_store(&prefix, result?);
        self.sort.sort(&mut entries);

        let rendered = render(self.listing.format, &prefix, &entries)?;
        let body = Bytes::from(rendered.body);
        let metadata = ObjectMetadata {
            content_length: body.len() as u64,
            content_type: Some(rendered.content_type.to_string()),
            ..Default::default()
        };
        self.cache.populate(
            cache_key,
            CacheEntry::response(metadata, body.clone(), self.cache.ttl()),
        );

        Ok(listing_response(rendered.content_type, body, head))
    }
}

//! Response assembly.
//!
//! # Responsibilities
//! - Translate object metadata into response headers
//! - Apply configured header overrides
//! - Rewrite redirect locations that point back at the bucket
//!
//! # Design Decisions
//! - One metadata type for get, head and cache hits, so every path through
//!   the pipeline produces identical headers
//! - `Content-Length` is only set for bodies the gateway does not know to be
//!   encoded; the compression layer drops it when it compresses
//! - Header values that are not valid HTTP are skipped, never fatal

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use url::Url;

use crate::config::SiteConfig;
use crate::store::{ObjectBody, ObjectMetadata};

/// HTTP-date (RFC 7231) rendering of a timestamp.
pub fn http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Response body for an object body.
pub fn body_from(body: ObjectBody) -> Body {
    match body {
        ObjectBody::Buffered(bytes) => Body::from(bytes),
        ObjectBody::Stream(stream) => Body::from_stream(stream),
    }
}

fn set(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }
}

/// Path-only form of `location` when it points at the bucket's own host.
pub fn rewrite_location(location: &str, bucket: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    let host = url.host_str()?;
    if bucket.is_empty() || !host.contains(bucket) {
        return None;
    }
    Some(match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    })
}

/// Build an object response. HEAD responses answer 200 with no body.
pub fn object_response(
    metadata: &ObjectMetadata,
    body: Body,
    head: bool,
    site: &SiteConfig,
    bucket: &str,
) -> Response {
    let status = if !head && metadata.content_range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut response = Response::new(if head { Body::empty() } else { body });
    *response.status_mut() = status;
    let headers = response.headers_mut();

    set(
        headers,
        header::CACHE_CONTROL,
        site.cache_control.as_deref().or(metadata.cache_control.as_deref()),
    );
    set(
        headers,
        header::EXPIRES,
        site.expires.as_deref().or(metadata.expires.as_deref()),
    );
    set(headers, header::CONTENT_ENCODING, metadata.content_encoding.as_deref());
    set(headers, header::CONTENT_LANGUAGE, metadata.content_language.as_deref());

    if metadata.content_encoding.as_deref().unwrap_or("").is_empty() && metadata.content_length > 0 {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.content_length));
    }
    if !head {
        set(headers, header::CONTENT_RANGE, metadata.content_range.as_deref());
    }
    set(
        headers,
        header::CONTENT_TYPE,
        site.content_type.as_deref().or(metadata.content_type.as_deref()),
    );
    set(
        headers,
        header::CONTENT_DISPOSITION,
        site.content_disposition
            .as_deref()
            .or(metadata.content_disposition.as_deref()),
    );
    set(headers, header::ETAG, metadata.etag.as_deref());
    if let Some(modified) = &metadata.last_modified {
        set(headers, header::LAST_MODIFIED, Some(&http_date(modified)));
    }

    if let Some(location) = metadata.location.as_deref() {
        let location = rewrite_location(location, bucket).unwrap_or_else(|| location.to_string());
        set(headers, header::LOCATION, Some(&location));
    }

    response
}

/// Build a listing response.
pub fn listing_response(content_type: &str, body: Bytes, head: bool) -> Response {
    let mut response = Response::new(if head { Body::empty() } else { Body::from(body) });
    set(response.headers_mut(), header::CONTENT_TYPE, Some(content_type));
    response
}

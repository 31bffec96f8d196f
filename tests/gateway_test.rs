//! Router-level tests of the request pipeline.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};

use object_gateway::config::ListingFormat;
use object_gateway::store::memory::MemoryObject;

mod common;

#[tokio::test]
async fn test_root_serves_index_document() {
    let app = common::app(common::config(), common::site_store());

    let res = common::send(&app, common::get("/")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "<h1>home</h1>");
    assert_eq!(res.header("content-type"), Some("text/html"));

    let res = common::send(&app, common::get("//docs///")).await;
    assert_eq!(res.text(), "<h1>docs</h1>");
}

#[tokio::test]
async fn test_percent_encoded_keys() {
    let app = common::app(common::config(), common::site_store());
    let res = common::send(&app, common::get("/my%20file.txt")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "spaced");
}

#[tokio::test]
async fn test_missing_key_is_404_with_plain_body() {
    let app = common::app(common::config(), common::site_store());
    let res = common::send(&app, common::get("/nope.txt")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.header("content-type").unwrap().starts_with("text/plain"));
}

#[tokio::test]
async fn test_spa_fallback_through_router() {
    let mut config = common::config();
    config.site.spa = true;
    let app = common::app(config, common::site_store());

    let res = common::send(&app, common::get("/docs/client/route")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = common::send(&app, common::get("/docs/route")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "<h1>docs</h1>");
}

#[tokio::test]
async fn test_strip_path_and_key_prefix() {
    let store = common::site_store();
    store.put("www/app.js", MemoryObject::new("js", "application/javascript"));
    let mut config = common::config();
    config.site.strip_path = "/static".into();
    config.store.key_prefix = "/www".into();
    let app = common::app(config, store);

    let res = common::send(&app, common::get("/static/app.js")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "js");
}

#[tokio::test]
async fn test_other_methods_are_405() {
    let app = common::app(common::config(), common::site_store());
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/index.html")
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, request).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_head_has_headers_and_no_body() {
    let app = common::app(common::config(), common::site_store());
    let request = Request::builder()
        .method(Method::HEAD)
        .uri("/docs/guide.txt")
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, request).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-length"), Some("7"));
    assert!(res.body.is_empty());
}

#[tokio::test]
async fn test_range_request_is_partial() {
    let app = common::app(common::config(), common::site_store());
    let request = Request::builder()
        .uri("/docs/guide.txt")
        .header(header::RANGE, "bytes=0-3")
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, request).await;
    assert_eq!(res.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.text(), "read");
    assert_eq!(res.header("content-range"), Some("bytes 0-3/7"));
}

#[tokio::test]
async fn test_range_ending_at_u64_max_serves_whole_object() {
    let app = common::app(common::config(), common::site_store());
    let request = Request::builder()
        .uri("/docs/guide.txt")
        .header(header::RANGE, "bytes=0-18446744073709551615")
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, request).await;
    assert_eq!(res.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.text(), "read me");
    assert_eq!(res.header("content-range"), Some("bytes 0-6/7"));
}

#[tokio::test]
async fn test_header_overrides() {
    let mut config = common::config();
    config.site.cache_control = Some("no-store".into());
    config.site.content_type = Some("application/octet-stream".into());
    let app = common::app(config, common::site_store());

    let res = common::send(&app, common::get("/docs/guide.txt")).await;
    assert_eq!(res.header("cache-control"), Some("no-store"));
    assert_eq!(res.header("content-type"), Some("application/octet-stream"));
}

#[tokio::test]
async fn test_gzip_when_accepted() {
    let mut config = common::config();
    config.site.content_encoding = true;
    let app = common::app(config, common::site_store());

    let request = Request::builder()
        .uri("/docs/guide.txt")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, request).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-encoding"), Some("gzip"));
    assert_eq!(res.header("content-length"), None);

    // gzip magic bytes
    assert_eq!(&res.body[..2], &[0x1f, 0x8b]);
}

#[tokio::test]
async fn test_no_compression_when_disabled() {
    let app = common::app(common::config(), common::site_store());
    let request = Request::builder()
        .uri("/docs/guide.txt")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, request).await;
    assert_eq!(res.header("content-encoding"), None);
    assert_eq!(res.text(), "read me");
}

#[tokio::test]
async fn test_html_listing() {
    let mut config = common::config();
    config.listing.enabled = true;
    config.listing.format = ListingFormat::Shtml;
    let app = common::app(config, common::site_store());

    let res = common::send(&app, common::get("/docs/")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.header("content-type").unwrap().starts_with("text/html"));
    assert!(res.text().contains("guide.txt"));
    assert!(res.text().contains("index.html"));
}

#[tokio::test]
async fn test_listing_check_index_prefers_index() {
    let mut config = common::config();
    config.listing.enabled = true;
    config.listing.check_index = true;
    let app = common::app(config, common::site_store());

    let res = common::send(&app, common::get("/docs/")).await;
    assert_eq!(res.text(), "<h1>docs</h1>");
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let app = common::app(common::config(), common::site_store());

    let res = common::send(&app, common::get("/")).await;
    let generated = res.header("x-request-id").unwrap();
    assert_eq!(generated.len(), 36);

    let request = Request::builder()
        .uri("/")
        .header("x-request-id", "client-chosen")
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, request).await;
    assert_eq!(res.header("x-request-id"), Some("client-chosen"));
}

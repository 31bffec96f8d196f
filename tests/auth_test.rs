//! Auth gate, CORS and side-channel tests through the router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use object_gateway::config::{BasicCredential, GatewayConfig};

mod common;

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

fn with_header(path: &str, name: header::HeaderName, value: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(name, value)
        .body(Body::empty())
        .unwrap()
}

fn guarded() -> GatewayConfig {
    let mut config = common::config();
    config.auth.allow_ip_ranges = vec!["10.0.0.0/8".into()];
    config.auth.basic = vec![BasicCredential {
        username: "ops".into(),
        password: "s3cret".into(),
    }];
    config.cors.allow_origin = "*".into();
    config.cors.allow_methods = "GET, HEAD".into();
    config.cors.allow_headers = "Range".into();
    config
}

#[tokio::test]
async fn test_ip_check_runs_before_basic() {
    let app = common::app(guarded(), common::site_store());

    // valid credentials, address outside the allow-list
    let request = with_header("/", header::AUTHORIZATION, &basic("ops", "s3cret"));
    let res = common::send(&app, common::from_peer(request, "192.168.1.9:5000")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.header("www-authenticate"), Some("Basic realm=\"REALM\""));
    assert_eq!(res.header("access-control-allow-origin"), None);

    let request = with_header("/", header::AUTHORIZATION, &basic("ops", "s3cret"));
    let res = common::send(&app, common::from_peer(request, "10.1.2.3:5000")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("access-control-allow-origin"), Some("*"));
    assert_eq!(res.header("access-control-max-age"), Some("600"));
}

#[tokio::test]
async fn test_bad_credentials_get_cors_and_challenge() {
    let app = common::app(guarded(), common::site_store());

    let request = with_header("/", header::AUTHORIZATION, &basic("ops", "wrong"));
    let res = common::send(&app, common::from_peer(request, "10.1.2.3:5000")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.text(), "Unauthorized\n");
    assert_eq!(res.header("www-authenticate"), Some("Basic realm=\"REALM\""));
    assert_eq!(res.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn test_forwarded_for_header_decides_address() {
    let mut config = guarded();
    config.auth.basic.clear();
    config.auth.forwarded_for = Some("X-Forwarded-For".into());
    let app = common::app(config, common::site_store());

    let request = with_header("/", header::HeaderName::from_static("x-forwarded-for"), "10.9.9.9, 172.16.0.1");
    let res = common::send(&app, common::from_peer(request, "192.168.1.9:5000")).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_jwt_checked_after_basic() {
    let mut config = common::config();
    config.auth.jwt_secret = Some("jwt-secret".into());
    config.auth.jwt_header = Some("X-Token".into());
    let app = common::app(config, common::site_store());

    let token = encode(
        &Header::default(),
        &json!({ "sub": "alice" }),
        &EncodingKey::from_secret(b"jwt-secret"),
    )
    .unwrap();
    let res = common::send(
        &app,
        with_header("/", header::HeaderName::from_static("x-token"), &token),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let forged = encode(
        &Header::default(),
        &json!({ "sub": "alice" }),
        &EncodingKey::from_secret(b"other"),
    )
    .unwrap();
    let res = common::send(
        &app,
        with_header("/", header::HeaderName::from_static("x-token"), &forged),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = common::send(&app, common::get("/")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_side_channels_bypass_auth() {
    let mut config = guarded();
    config.observability.health_check_path = "/healthz".into();
    config.observability.version_path = "/version".into();
    config.observability.metrics_path = "/metrics".into();
    let app = common::app(config, common::site_store());

    let res = common::send(&app, common::from_peer(common::get("/healthz"), "192.168.1.9:5000")).await;
    assert_eq!(res.status, StatusCode::OK);
    let report: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(report["bucket"]["healthy"], true);
    assert!(report["bucket"].get("error").is_none());

    let res = common::send(&app, common::from_peer(common::get("/version"), "192.168.1.9:5000")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text().starts_with(env!("CARGO_PKG_VERSION")));

    let res = common::send(&app, common::from_peer(common::get("/metrics"), "192.168.1.9:5000")).await;
    assert_eq!(res.status, StatusCode::OK);

    // everything else stays gated
    let res = common::send(&app, common::from_peer(common::get("/healthz/x"), "192.168.1.9:5000")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unhealthy_store_is_500() {
    let store = common::site_store();
    store.deny("healthz");
    let mut config = common::config();
    config.observability.health_check_path = "/healthz".into();
    let app = common::app(config, store);

    let res = common::send(&app, common::get("/healthz")).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let report: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(report["bucket"]["healthy"], false);
    assert!(report["bucket"]["error"].as_str().unwrap().contains("AccessDenied"));
}

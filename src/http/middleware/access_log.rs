//! Access log middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, Request},
    middleware::Next,
    response::Response,
};

use super::access_control::remote_addr;
use crate::http::server::AppState;
use crate::observability::logging::AccessRecord;
use crate::security::Identity;

fn header_or_dash(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Emit one access log record per request once the response is known.
pub async fn access_log_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let headers = req.headers();
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "-".to_string());
    let client_ip = state.gate.client_ip(headers, remote_addr(&req));
    let referer = header_or_dash(headers, header::REFERER);
    let user_agent = header_or_dash(headers, header::USER_AGENT);
    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let protocol = format!("{:?}", req.version());

    let response = next.run(req).await;

    let identity = response
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or_default();
    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());

    AccessRecord {
        host,
        client_ip,
        identity: identity.to_string(),
        method,
        uri,
        protocol,
        status: response.status().as_u16(),
        size,
        referer,
        user_agent,
        elapsed: start.elapsed(),
    }
    .emit();

    response
}

//! Access control middleware.
//! Runs the auth gate and decorates responses with CORS headers.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::http::server::AppState;
use crate::security::AuthRejection;

/// Address of the TCP peer, when the server was built with connect info.
pub(crate) fn remote_addr<B>(req: &Request<B>) -> Option<SocketAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

pub async fn access_control_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Side channels are never gated.
    if state.is_side_channel(req.uri().path()) {
        return next.run(req).await;
    }

    let client = state.gate.client_ip(req.headers(), remote_addr(&req));
    let mut response = match state.gate.evaluate(req.headers(), client) {
        Ok(identity) => {
            req.extensions_mut().insert(identity.clone());
            let mut response = next.run(req).await;
            response.extensions_mut().insert(identity);
            response
        }
        Err(rejection @ AuthRejection::AddressNotAllowed) => {
            warn!(client = ?client, "Rejected request from address outside the allow-list");
            return rejection.into_response();
        }
        Err(rejection) => {
            warn!(client = ?client, reason = %rejection, "Rejected unauthenticated request");
            rejection.into_response()
        }
    };

    if let Some(cors) = state.gate.cors() {
        cors.apply(response.headers_mut());
    }
    response
}

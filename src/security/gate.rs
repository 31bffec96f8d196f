//! The authorization gate.
//!
//! # Responsibilities
//! - Apply the access checks in their fixed order: IP allow-list, Basic,
//!   bearer token
//! - Resolve the requester identity used by the access log
//!
//! # Design Decisions
//! - Each failing check short-circuits; later checks never run
//! - Identity is logging metadata only, it never grants access
//! - Built once from configuration and shared read-only by every request

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use super::basic;
use super::cors::CorsHeaders;
use super::ip_allow::{client_ip, IpAllowList};
use super::jwt::{JwtVerifier, TokenCheck};
use crate::config::{AuthConfig, BasicCredential, CorsConfig};

/// Resolved requester identity. Anonymous unless a header, Basic or a token set it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity(Option<String>);

impl Identity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(Some(name.into()))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or("-"))
    }
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("client address not allowed")]
    AddressNotAllowed,
    #[error("basic credentials required")]
    BadCredentials,
    #[error("bearer token invalid")]
    BadToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from("Unauthorized\n"));
        *response.status_mut() = StatusCode::UNAUTHORIZED;
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"REALM\""),
        );
        response
    }
}

/// Access checks built from configuration.
pub struct AuthGate {
    allow: IpAllowList,
    forwarded_for: Option<HeaderName>,
    username_header: Option<HeaderName>,
    basic: Vec<BasicCredential>,
    jwt: Option<JwtVerifier>,
    cors: Option<CorsHeaders>,
}

fn header_name(value: &Option<String>) -> Option<HeaderName> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .and_then(|v| HeaderName::from_bytes(v.as_bytes()).ok())
}

impl AuthGate {
    pub fn from_config(auth: &AuthConfig, cors: &CorsConfig) -> Self {
        Self {
            allow: IpAllowList::from_config(&auth.allow_ip_ranges),
            forwarded_for: header_name(&auth.forwarded_for),
            username_header: header_name(&auth.username_header),
            basic: auth.basic.clone(),
            jwt: JwtVerifier::new(
                auth.jwt_secret.as_deref(),
                header_name(&auth.jwt_header),
                auth.jwt_user_field.as_deref(),
            ),
            cors: CorsHeaders::from_config(cors),
        }
    }

    /// Caller address, honouring the trusted forwarded-for header.
    pub fn client_ip(&self, headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<IpAddr> {
        client_ip(headers, self.forwarded_for.as_ref(), remote)
    }

    /// CORS headers to add to responses that passed the address check.
    pub fn cors(&self) -> Option<&CorsHeaders> {
        self.cors.as_ref()
    }

    /// Run every configured check in order.
    pub fn evaluate(
        &self,
        headers: &HeaderMap,
        client: Option<IpAddr>,
    ) -> Result<Identity, AuthRejection> {
        if self.allow.is_enabled() && !self.allow.permits(client) {
            return Err(AuthRejection::AddressNotAllowed);
        }

        let mut identity = self
            .username_header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(Identity::named)
            .unwrap_or_default();

        if !self.basic.is_empty() {
            match basic::authenticate(headers, &self.basic) {
                Some(username) => identity = Identity::named(username),
                None => return Err(AuthRejection::BadCredentials),
            }
        }

        if let Some(jwt) = &self.jwt {
            match jwt.check(headers) {
                TokenCheck::Valid(Some(name)) => identity = Identity::named(name),
                TokenCheck::Valid(None) => {}
                TokenCheck::Rejected => return Err(AuthRejection::BadToken),
            }
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn basic_header(user: &str, pass: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass))))
            .unwrap()
    }

    fn auth_with_basic() -> AuthConfig {
        AuthConfig {
            basic: vec![BasicCredential {
                username: "user".into(),
                password: "pass".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_open_gate_is_anonymous() {
        let gate = AuthGate::from_config(&AuthConfig::default(), &CorsConfig::default());
        let identity = gate.evaluate(&HeaderMap::new(), None).unwrap();
        assert_eq!(identity, Identity::anonymous());
        assert_eq!(identity.to_string(), "-");
        assert!(gate.cors().is_none());
    }

    #[test]
    fn test_address_check_runs_before_basic() {
        let mut auth = auth_with_basic();
        auth.allow_ip_ranges = vec!["10.0.0.0/8".into()];
        let gate = AuthGate::from_config(&auth, &CorsConfig::default());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, basic_header("user", "pass"));

        assert_eq!(
            gate.evaluate(&headers, Some("192.168.0.1".parse().unwrap())),
            Err(AuthRejection::AddressNotAllowed)
        );
        assert_eq!(
            gate.evaluate(&headers, Some("10.1.2.3".parse().unwrap())),
            Ok(Identity::named("user"))
        );
    }

    #[test]
    fn test_basic_overrides_username_header() {
        let mut auth = auth_with_basic();
        auth.username_header = Some("X-User".into());
        let gate = AuthGate::from_config(&auth, &CorsConfig::default());

        let mut headers = HeaderMap::new();
        headers.insert("x-user", HeaderValue::from_static("from-header"));
        assert_eq!(gate.evaluate(&headers, None), Err(AuthRejection::BadCredentials));

        headers.insert(header::AUTHORIZATION, basic_header("user", "pass"));
        assert_eq!(gate.evaluate(&headers, None), Ok(Identity::named("user")));
    }

    #[test]
    fn test_username_header_only() {
        let auth = AuthConfig {
            username_header: Some("X-User".into()),
            ..Default::default()
        };
        let gate = AuthGate::from_config(&auth, &CorsConfig::default());
        let mut headers = HeaderMap::new();
        headers.insert("x-user", HeaderValue::from_static("alice"));
        assert_eq!(gate.evaluate(&headers, None), Ok(Identity::named("alice")));
    }

    #[test]
    fn test_jwt_after_basic() {
        let mut auth = auth_with_basic();
        auth.jwt_secret = Some("secret".into());
        let gate = AuthGate::from_config(&auth, &CorsConfig::default());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, basic_header("user", "pass"));
        // Basic passes, but the same header carries no bearer token
        assert_eq!(gate.evaluate(&headers, None), Err(AuthRejection::BadToken));
    }

    #[test]
    fn test_rejection_response() {
        let response = AuthRejection::BadCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic realm=\"REALM\"");
    }
}

//! HTTP Basic credentials.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::BasicCredential;

/// Extract `(username, password)` from an `Authorization: Basic` header.
pub fn credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Username of the first configured pair matching the request, if any.
pub fn authenticate<'a>(headers: &HeaderMap, allowed: &'a [BasicCredential]) -> Option<&'a str> {
    let (username, password) = credentials(headers)?;
    allowed
        .iter()
        .find(|c| c.username == username && c.password == password)
        .map(|c| c.username.as_str())
}

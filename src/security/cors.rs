//! CORS response headers.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::CorsConfig;

/// Precomputed CORS header values.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    origin: HeaderValue,
    methods: HeaderValue,
    headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsHeaders {
    /// Returns `None` unless origin, methods, headers and a positive max-age are all set.
    pub fn from_config(config: &CorsConfig) -> Option<Self> {
        if config.allow_origin.is_empty()
            || config.allow_methods.is_empty()
            || config.allow_headers.is_empty()
            || config.max_age <= 0
        {
            return None;
        }

        Some(Self {
            origin: HeaderValue::from_str(&config.allow_origin).ok()?,
            methods: HeaderValue::from_str(&config.allow_methods).ok()?,
            headers: HeaderValue::from_str(&config.allow_headers).ok()?,
            max_age: HeaderValue::from(config.max_age),
        })
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone());
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> CorsConfig {
        CorsConfig {
            allow_origin: "*".into(),
            allow_methods: "GET, HEAD".into(),
            allow_headers: "Authorization".into(),
            max_age: 600,
        }
    }

    #[test]
    fn test_requires_all_four() {
        assert!(CorsHeaders::from_config(&full()).is_some());
        assert!(CorsHeaders::from_config(&CorsConfig::default()).is_none());
        let mut config = full();
        config.max_age = 0;
        assert!(CorsHeaders::from_config(&config).is_none());
    }

    #[test]
    fn test_apply() {
        let mut headers = HeaderMap::new();
        CorsHeaders::from_config(&full()).unwrap().apply(&mut headers);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
    }
}

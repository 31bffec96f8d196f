//! Request-level errors and their HTTP mapping.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::store::StoreError;

/// Why a request could not be served.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The symlink document could not be parsed.
    #[error("malformed symlink document: {0}")]
    Symlink(String),

    /// A listing could not be serialized.
    #[error("{0}")]
    Render(#[from] serde_json::Error),

    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            GatewayError::Store(StoreError::AccessDenied(_)) => StatusCode::FORBIDDEN,
            GatewayError::Store(StoreError::InvalidRange(_)) => StatusCode::RANGE_NOT_SATISFIABLE,
            GatewayError::Store(StoreError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Store(StoreError::Backend(_)) => StatusCode::BAD_GATEWAY,
            GatewayError::Symlink(_) | GatewayError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let mut response = (status, format!("{}\n", self)).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        response
    }
}

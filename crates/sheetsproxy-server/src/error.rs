//! Server error types.

use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sheetsproxy_auth::AuthError;
use thiserror::Error;
use tracing::warn;

/// Result type for server operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Errors that can occur while serving a request or starting the server.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Building the authenticated client failed.
    #[error("client setup failed: {0}")]
    Setup(#[from] AuthError),

    /// The caller sent a malformed or incomplete request.
    #[error("invalid request: {0}")]
    Input(String),

    /// The spreadsheet service call failed.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// Encoding the response failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (listener, socket).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ProxyError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Short category name used in logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Setup(_) => "setup",
            Self::Input(_) => "input",
            Self::Upstream(_) => "upstream",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Config { .. } => "config",
        }
    }
}

/// Every failure reaches the caller as the same plain `400 Bad Request`;
/// the cause only goes to the log.
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        warn!(category = self.category(), error = %self, "request failed");
        (StatusCode::BAD_REQUEST, "Bad Request").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn every_category_is_a_bad_request() {
        let errors = vec![
            ProxyError::Setup(AuthError::invalid_payload("invalid credential payload")),
            ProxyError::Input("range is required".into()),
            ProxyError::Upstream("API error (404)".into()),
            ProxyError::Io(io::Error::other("boom")),
            ProxyError::config("missing secret"),
        ];
        for err in errors {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.headers()["content-type"],
                "text/plain; charset=utf-8"
            );
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"Bad Request");
        }
    }

    #[test]
    fn categories() {
        assert_eq!(ProxyError::Input("x".into()).category(), "input");
        assert_eq!(
            ProxyError::Setup(AuthError::configuration("x")).category(),
            "setup"
        );
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ProxyError::from(json_err).category(), "serialization");
    }
}

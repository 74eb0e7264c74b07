//! Client error types.

use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// A secret reference could not be resolved.
    Secret(String),
    /// Credential or Google API error.
    Auth(sheetsproxy_auth::AuthError),
    /// Proxy server error.
    Server(sheetsproxy_server::ProxyError),
    /// IO error.
    Io(std::io::Error),
    /// HTTP request to a proxy failed.
    Request(String),
    /// Request timed out.
    Timeout(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Secret(msg) => write!(f, "secret reference error: {}", msg),
            Self::Auth(err) => write!(f, "{}", err),
            Self::Server(err) => write!(f, "server error: {}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Request(msg) => write!(f, "request failed: {}", msg),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            Self::Server(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<sheetsproxy_auth::AuthError> for ClientError {
    fn from(err: sheetsproxy_auth::AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<sheetsproxy_server::ProxyError> for ClientError {
    fn from(err: sheetsproxy_server::ProxyError) -> Self {
        Self::Server(err)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

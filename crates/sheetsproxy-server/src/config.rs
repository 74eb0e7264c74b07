//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use sheetsproxy_auth::secrets::SECRET_MANAGER_BASE_URL;

use crate::error::{ProxyError, ProxyResult};
use crate::sheets::SHEETS_BASE_URL;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,

    /// Secret Manager version holding the proxy's credentials,
    /// `projects/*/secrets/*/versions/*`.
    pub secret: String,

    /// Sheets API endpoint.
    pub sheets_base_url: String,

    /// Secret Manager endpoint.
    pub secret_manager_base_url: String,

    /// Timeout for outbound HTTP requests.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            secret: String::new(),
            sheets_base_url: SHEETS_BASE_URL.to_string(),
            secret_manager_base_url: SECRET_MANAGER_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration reading credentials from `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Builder: set the listen address.
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Builder: set the Sheets API endpoint.
    pub fn with_sheets_base_url(mut self, url: impl Into<String>) -> Self {
        self.sheets_base_url = url.into();
        self
    }

    /// Builder: set the Secret Manager endpoint.
    pub fn with_secret_manager_base_url(mut self, url: impl Into<String>) -> Self {
        self.secret_manager_base_url = url.into();
        self
    }

    /// Builder: set the outbound request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Checks that the configuration can be served.
    pub fn validate(&self) -> ProxyResult<()> {
        if self.secret.trim().is_empty() {
            return Err(ProxyError::config("secret name is required"));
        }
        for (name, value) in [
            ("sheets base URL", &self.sheets_base_url),
            ("secret manager base URL", &self.secret_manager_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ProxyError::config(format!("invalid {} '{}': {}", name, value, e)))?;
        }
        if self.request_timeout.is_zero() {
            return Err(ProxyError::config("request timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Builds the outbound HTTP client shared by every upstream call.
    pub fn http_client(&self) -> ProxyResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ProxyError::config(format!("failed to build HTTP client: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.sheets_base_url, "https://sheets.googleapis.com");
        // no secret configured
        assert!(config.validate().is_err());
    }

    #[test]
    fn custom_config() {
        let config = ServerConfig::new("projects/p/secrets/s/versions/latest")
            .with_bind("127.0.0.1:9000".parse().unwrap())
            .with_sheets_base_url("http://127.0.0.1:1234")
            .with_secret_manager_base_url("http://127.0.0.1:5678")
            .with_request_timeout(Duration::from_secs(5));

        assert!(config.validate().is_ok());
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.http_client().is_ok());
    }

    #[test]
    fn rejects_bad_urls_and_timeouts() {
        let config = ServerConfig::new("s").with_sheets_base_url("not a url");
        assert!(matches!(config.validate(), Err(ProxyError::Config { .. })));

        let config = ServerConfig::new("s").with_request_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}

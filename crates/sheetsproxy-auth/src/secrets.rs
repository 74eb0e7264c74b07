//! Secret Manager access.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::resolver::AuthMechanism;
use crate::token::BoxFuture;

/// Default Secret Manager endpoint.
pub const SECRET_MANAGER_BASE_URL: &str = "https://secretmanager.googleapis.com";

/// Retrieves the raw bytes of a secret version.
pub trait SecretFetcher: Send + Sync {
    /// Fetches `name` (`projects/*/secrets/*/versions/*`) using `mechanism`
    /// to authorize the call.
    fn fetch<'a>(&'a self, mechanism: &'a AuthMechanism, name: &'a str) -> BoxFuture<'a, AuthResult<Vec<u8>>>;
}

/// Google Secret Manager v1 client.
#[derive(Debug, Clone)]
pub struct SecretManagerClient {
    base_url: String,
    http: reqwest::Client,
}

impl SecretManagerClient {
    /// Creates a client against the public endpoint.
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(SECRET_MANAGER_BASE_URL, http)
    }

    /// Creates a client against an explicit endpoint.
    pub fn with_base_url(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn access(&self, mechanism: &AuthMechanism, name: &str) -> AuthResult<Vec<u8>> {
        let token = mechanism.token_source().token().await?;
        let url = format!("{}/v1/{}:access", self.base_url, name.trim_start_matches('/'));
        debug!(secret = %name, "accessing secret version");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| AuthError::from_transport("failed to reach Secret Manager", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = match status.as_u16() {
                401 | 403 => AuthError::authorization(format!("access to secret {} denied: {}", name, body)),
                _ => AuthError::from_status(status, &body),
            };
            return Err(err.with_source_name("secretmanager"));
        }

        let body: AccessResponse = response.json().await.map_err(|e| {
            AuthError::invalid_response(format!("invalid Secret Manager response: {}", e))
        })?;
        STANDARD
            .decode(body.payload.data.as_bytes())
            .map_err(|e| AuthError::invalid_response(format!("secret payload is not base64: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct AccessResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

impl SecretFetcher for SecretManagerClient {
    fn fetch<'a>(&'a self, mechanism: &'a AuthMechanism, name: &'a str) -> BoxFuture<'a, AuthResult<Vec<u8>>> {
        Box::pin(self.access(mechanism, name))
    }
}

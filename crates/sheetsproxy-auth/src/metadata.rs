//! Compute metadata server token source.
//!
//! On Google Cloud runtimes (Compute Engine, Cloud Run, Cloud Functions) the
//! metadata server hands out tokens for the attached service account.

use serde::Deserialize;

use crate::error::{AuthError, AuthResult};
use crate::token::{AccessToken, BoxFuture, TokenSource};

/// Default metadata server host.
pub const METADATA_HOST: &str = "metadata.google.internal";

/// Environment variable overriding the metadata server host.
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

/// Token source backed by the metadata server.
#[derive(Debug, Clone)]
pub struct MetadataTokenSource {
    base_url: String,
    scopes: String,
    http: reqwest::Client,
}

impl MetadataTokenSource {
    /// Creates a source using `GCE_METADATA_HOST` or the default host.
    pub fn from_env(scopes: &[String], http: reqwest::Client) -> Self {
        let host = std::env::var(METADATA_HOST_ENV).unwrap_or_else(|_| METADATA_HOST.to_string());
        Self::with_base_url(format!("http://{}", host), scopes, http)
    }

    /// Creates a source against an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>, scopes: &[String], http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            scopes: scopes.join(","),
            http,
        }
    }

    /// Fetches the project id of the running instance.
    pub async fn project_id(&self) -> AuthResult<String> {
        let url = format!("{}/computeMetadata/v1/project/project-id", self.base_url);
        let body = self.get(&url, &[]).await?;
        Ok(body.trim().to_string())
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> AuthResult<String> {
        let response = self
            .http
            .get(url)
            .header("Metadata-Flavor", "Google")
            .query(query)
            .send()
            .await
            .map_err(|e| AuthError::from_transport("metadata server unreachable", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::network(format!("failed to read metadata response: {}", e)))?;
        if !status.is_success() {
            return Err(AuthError::from_status(status, &body));
        }
        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenSource for MetadataTokenSource {
    fn name(&self) -> &str {
        "metadata"
    }

    fn token(&self) -> BoxFuture<'_, AuthResult<AccessToken>> {
        Box::pin(async move {
            let url = format!(
                "{}/computeMetadata/v1/instance/service-accounts/default/token",
                self.base_url
            );
            let body = self.get(&url, &[("scopes", self.scopes.as_str())]).await?;
            let token: MetadataToken = serde_json::from_str(&body).map_err(|e| {
                AuthError::invalid_response(format!("invalid metadata token: {}", e))
            })?;
            Ok(AccessToken::new(token.access_token, token.expires_in))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;
    use httpmock::Method::GET;
    use httpmock::MockServer;

    #[tokio::test]
    async fn fetches_token_with_flavor_header() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/computeMetadata/v1/instance/service-accounts/default/token")
                .header("Metadata-Flavor", "Google")
                .query_param("scopes", crate::scopes().join(","));
            then.status(200)
                .body(r#"{"access_token":"ya29.md","expires_in":3599,"token_type":"Bearer"}"#);
        });

        let source =
            MetadataTokenSource::with_base_url(server.base_url(), &crate::scopes(), reqwest::Client::new());
        let token = source.token().await.unwrap();
        mock.assert();
        assert_eq!(token.token, "ya29.md");
    }

    #[tokio::test]
    async fn reads_project_id() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/computeMetadata/v1/project/project-id");
            then.status(200).body("sheets-lab\n");
        });

        let source =
            MetadataTokenSource::with_base_url(server.base_url(), &crate::scopes(), reqwest::Client::new());
        assert_eq!(source.project_id().await.unwrap(), "sheets-lab");
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET);
            then.status(404).body("not found");
        });

        let source =
            MetadataTokenSource::with_base_url(server.base_url(), &crate::scopes(), reqwest::Client::new());
        assert_eq!(source.token().await.unwrap_err().code(), AuthErrorCode::NotFound);
    }
}

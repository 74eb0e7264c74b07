//! IAM Credentials API: minting ID tokens for service accounts.
//!
//! Used to call the proxy itself when it is deployed behind an
//! identity-aware front end (Cloud Run, Cloud Functions).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::AuthenticatedClient;
use crate::error::{AuthError, AuthResult};

/// Default IAM Credentials endpoint.
pub const IAM_CREDENTIALS_BASE_URL: &str = "https://iamcredentials.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIdTokenRequest<'a> {
    audience: &'a str,
    include_email: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateIdTokenResponse {
    token: String,
}

/// Mints OIDC ID tokens on behalf of a service account.
#[derive(Debug, Clone)]
pub struct IdTokenMinter {
    client: AuthenticatedClient,
    base_url: String,
}

impl IdTokenMinter {
    /// Creates a minter against the public endpoint.
    pub fn new(client: AuthenticatedClient) -> Self {
        Self::with_base_url(client, IAM_CREDENTIALS_BASE_URL)
    }

    /// Creates a minter against an explicit endpoint.
    pub fn with_base_url(client: AuthenticatedClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns an ID token for `service_account` with the given audience.
    ///
    /// The caller must hold `iam.serviceAccounts.getOpenIdToken` on the
    /// target account.
    pub async fn generate_id_token(&self, service_account: &str, audience: &str) -> AuthResult<String> {
        if service_account.is_empty() {
            return Err(AuthError::configuration("service account is required"));
        }
        let url = format!(
            "{}/v1/projects/-/serviceAccounts/{}:generateIdToken",
            self.base_url, service_account
        );
        debug!(service_account = %service_account, audience = %audience, "minting ID token");

        let builder = self
            .client
            .request(reqwest::Method::POST, &url)
            .await?
            .json(&GenerateIdTokenRequest {
                audience,
                include_email: true,
            });
        let response: GenerateIdTokenResponse = self.client.send_json(builder, "generateIdToken").await?;
        if response.token.is_empty() {
            return Err(AuthError::invalid_response("generateIdToken returned an empty token"));
        }
        Ok(response.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientOrigin;
    use crate::error::AuthErrorCode;
    use crate::token::StaticTokenSource;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use std::sync::Arc;

    const SA: &str = "invoker@sheets-lab.iam.gserviceaccount.com";

    fn minter(base_url: String) -> IdTokenMinter {
        let client = AuthenticatedClient::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenSource::new("ya29.caller")),
            ClientOrigin::ServiceAccount,
        );
        IdTokenMinter::with_base_url(client, base_url)
    }

    #[tokio::test]
    async fn mints_token() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("/v1/projects/-/serviceAccounts/{}:generateIdToken", SA))
                .header("authorization", "Bearer ya29.caller")
                .body_includes(r#""audience":"https://proxy.example.run.app""#)
                .body_includes(r#""includeEmail":true"#);
            then.status(200).body(r#"{"token": "eyJhbGciOi.id.token"}"#);
        });

        let token = minter(server.base_url())
            .generate_id_token(SA, "https://proxy.example.run.app")
            .await
            .unwrap();
        mock.assert();
        assert_eq!(token, "eyJhbGciOi.id.token");
    }

    #[tokio::test]
    async fn propagates_denial() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST);
            then.status(403).body(r#"{"error": {"status": "PERMISSION_DENIED"}}"#);
        });

        let err = minter(server.base_url())
            .generate_id_token(SA, "https://proxy.example.run.app")
            .await
            .unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::AuthorizationFailed);
    }
}

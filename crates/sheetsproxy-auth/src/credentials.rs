//! Generic Google credentials documents.
//!
//! [`Credentials::from_json`] accepts every credential file shape the
//! ambient-credential discovery and the payload interpreter need to handle:
//! service-account keys, gcloud user credentials (`authorized_user`) and
//! workload identity federation configs (`external_account`).

use std::sync::Arc;

use serde::Deserialize;

use crate::error::{AuthError, AuthResult};
use crate::external_account::{ExternalAccountConfig, ExternalAccountTokenSource};
use crate::service_account::{GOOGLE_TOKEN_URL, ServiceAccountKey};
use crate::token::{AccessToken, BoxFuture, CachedTokenSource, SharedTokenSource, TokenSource, exchange_form};

/// The shape of a credentials document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// A service-account key.
    ServiceAccount,
    /// End-user credentials with a refresh token.
    AuthorizedUser,
    /// Workload identity federation.
    ExternalAccount,
}

impl CredentialKind {
    /// Returns the `type` value used in credential files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceAccount => "service_account",
            Self::AuthorizedUser => "authorized_user",
            Self::ExternalAccount => "external_account",
        }
    }
}

/// Credentials parsed from a JSON document, ready to mint tokens.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// The project associated with the credentials, if the document names one.
    pub project_id: Option<String>,
    /// Shape of the document the credentials came from.
    pub kind: CredentialKind,
    /// Source of access tokens. Already cached.
    pub token_source: SharedTokenSource,
}

#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl Credentials {
    /// Parses a credentials document of any supported shape.
    pub fn from_json(payload: &[u8], scopes: &[String], http: reqwest::Client) -> AuthResult<Self> {
        let probe: TypeProbe = serde_json::from_slice(payload)
            .map_err(|e| AuthError::invalid_payload(format!("credentials are not JSON: {}", e)))?;

        match probe.kind.as_deref() {
            Some("service_account") => {
                let key = ServiceAccountKey::from_json(payload)?;
                Ok(Self {
                    project_id: key.project_id.clone(),
                    kind: CredentialKind::ServiceAccount,
                    token_source: CachedTokenSource::shared(Arc::new(key.token_source(scopes, http))),
                })
            }
            Some("authorized_user") => {
                let user: AuthorizedUser = serde_json::from_slice(payload).map_err(|e| {
                    AuthError::invalid_payload(format!("invalid authorized_user credentials: {}", e))
                })?;
                Ok(Self {
                    project_id: user.quota_project_id.clone(),
                    kind: CredentialKind::AuthorizedUser,
                    token_source: CachedTokenSource::shared(Arc::new(AuthorizedUserTokenSource {
                        user,
                        http,
                    })),
                })
            }
            Some("external_account") => {
                let config: ExternalAccountConfig = serde_json::from_slice(payload).map_err(|e| {
                    AuthError::invalid_payload(format!("invalid external_account credentials: {}", e))
                })?;
                config.validate()?;
                Ok(Self {
                    project_id: config.quota_project_id.clone(),
                    kind: CredentialKind::ExternalAccount,
                    token_source: CachedTokenSource::shared(Arc::new(
                        ExternalAccountTokenSource::new(config, scopes, http),
                    )),
                })
            }
            Some(other) => Err(AuthError::invalid_payload(format!(
                "unsupported credentials type \"{}\"",
                other
            ))),
            None => Err(AuthError::invalid_payload("credentials have no 'type' field")),
        }
    }
}

/// gcloud end-user credentials.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default)]
    quota_project_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("quota_project_id", &self.quota_project_id)
            .finish_non_exhaustive()
    }
}

/// Refresh-token grant for `authorized_user` credentials.
#[derive(Debug)]
pub struct AuthorizedUserTokenSource {
    user: AuthorizedUser,
    http: reqwest::Client,
}

impl TokenSource for AuthorizedUserTokenSource {
    fn name(&self) -> &str {
        "authorized-user"
    }

    fn token(&self) -> BoxFuture<'_, AuthResult<AccessToken>> {
        Box::pin(async move {
            let token_url = self.user.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URL);
            exchange_form(
                &self.http,
                token_url,
                &[
                    ("client_id", self.user.client_id.as_str()),
                    ("client_secret", self.user.client_secret.as_str()),
                    ("refresh_token", self.user.refresh_token.as_str()),
                    ("grant_type", "refresh_token"),
                ],
            )
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;
    use httpmock::Method::POST;
    use httpmock::MockServer;

    fn parse(json: &str) -> AuthResult<Credentials> {
        Credentials::from_json(json.as_bytes(), &crate::scopes(), reqwest::Client::new())
    }

    #[test]
    fn parses_service_account() {
        let json = crate::service_account::tests::key_json(GOOGLE_TOKEN_URL, "pem");
        let creds = parse(&json).unwrap();
        assert_eq!(creds.kind, CredentialKind::ServiceAccount);
        assert_eq!(creds.project_id.as_deref(), Some("sheets-lab"));
        assert_eq!(creds.token_source.name(), "service-account");
    }

    #[test]
    fn parses_authorized_user() {
        let creds = parse(
            r#"{"type": "authorized_user", "client_id": "id.apps.googleusercontent.com",
                "client_secret": "s", "refresh_token": "1//r", "quota_project_id": "quota-proj"}"#,
        )
        .unwrap();
        assert_eq!(creds.kind, CredentialKind::AuthorizedUser);
        assert_eq!(creds.project_id.as_deref(), Some("quota-proj"));
    }

    #[test]
    fn rejects_unknown_and_untyped() {
        let err = parse(r#"{"type": "impersonated_service_account"}"#).unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::InvalidPayload);

        let err = parse(r#"{"installed": {"client_id": "x", "client_secret": "y"}}"#).unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::InvalidPayload);

        let err = parse("not json").unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::InvalidPayload);
    }

    #[test]
    fn rejects_incomplete_authorized_user() {
        let err = parse(r#"{"type": "authorized_user", "client_id": "x"}"#).unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::InvalidPayload);
    }

    #[tokio::test]
    async fn authorized_user_refreshes_token() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .body_includes("grant_type=refresh_token")
                .body_includes("refresh_token=1%2F%2Fr");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"access_token":"ya29.user","expires_in":3600}"#);
        });

        let json = serde_json::json!({
            "type": "authorized_user",
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "1//r",
            "token_uri": server.url("/token"),
        })
        .to_string();
        let creds = parse(&json).unwrap();

        assert_eq!(creds.token_source.token().await.unwrap().token, "ya29.user");
        // second call is served from the cache
        assert_eq!(creds.token_source.token().await.unwrap().token, "ya29.user");
        mock.assert_calls(1);
    }
}

//! Turns a secret payload into an [`AuthenticatedClient`].

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::client::{AuthenticatedClient, ClientOrigin};
use crate::credentials::Credentials;
use crate::error::{AuthError, AuthResult};
use crate::service_account::ServiceAccountKey;
use crate::token::CachedTokenSource;

/// Builds a client from raw credential material.
pub trait PayloadInterpreter: Send + Sync {
    /// Interprets `payload` and returns a ready client.
    fn build_client(&self, payload: &[u8]) -> AuthResult<AuthenticatedClient>;
}

/// Interprets Google credential documents.
///
/// Shapes are tried in a fixed order and the first structurally valid one
/// wins: a service-account key, then any generic credentials document.
/// OAuth application configs (`installed`/`web`) are recognised but not
/// accepted, since they need an interactive consent flow.
#[derive(Debug, Clone)]
pub struct GooglePayloadInterpreter {
    scopes: Vec<String>,
    http: reqwest::Client,
}

impl GooglePayloadInterpreter {
    /// Creates an interpreter whose clients request `scopes`.
    pub fn new(scopes: &[String], http: reqwest::Client) -> Self {
        Self {
            scopes: scopes.to_vec(),
            http,
        }
    }

    fn from_service_account(&self, payload: &[u8]) -> AuthResult<AuthenticatedClient> {
        let key = ServiceAccountKey::from_json(payload)?;
        let source = key.token_source(&self.scopes, self.http.clone());
        let email = source.email().to_string();
        info!(email = %email, "using service account from secret payload");
        Ok(AuthenticatedClient::new(
            self.http.clone(),
            CachedTokenSource::shared(Arc::new(source)),
            ClientOrigin::ServiceAccount,
        )
        .with_email(email))
    }

    fn from_credentials(&self, payload: &[u8]) -> AuthResult<AuthenticatedClient> {
        let credentials = Credentials::from_json(payload, &self.scopes, self.http.clone())?;
        info!(kind = credentials.kind.as_str(), "using credentials from secret payload");
        Ok(AuthenticatedClient::new(
            self.http.clone(),
            credentials.token_source,
            ClientOrigin::Credentials(credentials.kind),
        ))
    }
}

#[derive(Deserialize)]
struct OAuthAppProbe {
    #[serde(default)]
    installed: Option<serde_json::Value>,
    #[serde(default)]
    web: Option<serde_json::Value>,
}

fn is_oauth_app_config(payload: &[u8]) -> bool {
    serde_json::from_slice::<OAuthAppProbe>(payload)
        .map(|probe| probe.installed.is_some() || probe.web.is_some())
        .unwrap_or(false)
}

impl PayloadInterpreter for GooglePayloadInterpreter {
    fn build_client(&self, payload: &[u8]) -> AuthResult<AuthenticatedClient> {
        match self.from_service_account(payload) {
            Ok(client) => return Ok(client),
            Err(e) => debug!(error = %e, "payload is not a service account key"),
        }

        if is_oauth_app_config(payload) {
            debug!("payload is an OAuth application config, which is not supported");
        }

        match self.from_credentials(payload) {
            Ok(client) => Ok(client),
            Err(e) => {
                debug!(error = %e, "payload is not a credentials document");
                Err(AuthError::invalid_payload("invalid credential payload").with_source(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialKind;
    use crate::error::AuthErrorCode;
    use crate::service_account::GOOGLE_TOKEN_URL;
    use crate::service_account::tests::{TEST_KEY_PEM, key_json};

    fn interpreter() -> GooglePayloadInterpreter {
        GooglePayloadInterpreter::new(&crate::scopes(), reqwest::Client::new())
    }

    #[test]
    fn service_account_key_takes_first_branch() {
        // Valid both as a key and as a generic credentials document.
        let payload = key_json(GOOGLE_TOKEN_URL, TEST_KEY_PEM);
        let client = interpreter().build_client(payload.as_bytes()).unwrap();
        assert_eq!(client.origin(), ClientOrigin::ServiceAccount);
        assert_eq!(client.email(), Some("worker@sheets-lab.iam.gserviceaccount.com"));
    }

    #[test]
    fn accepts_structurally_valid_key_with_bad_pem() {
        let payload = key_json(GOOGLE_TOKEN_URL, "not a pem");
        let client = interpreter().build_client(payload.as_bytes()).unwrap();
        assert_eq!(client.origin(), ClientOrigin::ServiceAccount);
    }

    #[test]
    fn accepts_key_without_private_key() {
        let payload = r#"{"type": "service_account", "client_email": "a@b"}"#;
        let client = interpreter().build_client(payload.as_bytes()).unwrap();
        assert_eq!(client.origin(), ClientOrigin::ServiceAccount);
        assert_eq!(client.email(), Some("a@b"));
    }

    #[test]
    fn falls_back_to_generic_credentials() {
        let payload = r#"{"type": "authorized_user", "client_id": "c",
                          "client_secret": "s", "refresh_token": "r"}"#;
        let client = interpreter().build_client(payload.as_bytes()).unwrap();
        assert_eq!(client.origin(), ClientOrigin::Credentials(CredentialKind::AuthorizedUser));
        assert_eq!(client.email(), None);
    }

    #[test]
    fn oauth_app_config_is_rejected() {
        let payload = r#"{"installed": {"client_id": "c", "client_secret": "s",
                          "redirect_uris": ["http://localhost"]}}"#;
        let err = interpreter().build_client(payload.as_bytes()).unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::InvalidPayload);
    }

    #[test]
    fn garbage_is_invalid_payload() {
        for payload in ["", "not json", "[]", r#"{"type": "mystery"}"#] {
            let err = interpreter().build_client(payload.as_bytes()).unwrap_err();
            assert_eq!(err.code(), AuthErrorCode::InvalidPayload, "payload {:?}", payload);
            assert!(err.message().contains("invalid credential payload"));
        }
    }
}

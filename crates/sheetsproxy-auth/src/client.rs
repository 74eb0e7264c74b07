//! HTTP client that authorizes every request with a bearer token.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::credentials::CredentialKind;
use crate::error::{AuthError, AuthResult};
use crate::token::SharedTokenSource;

/// The payload shape an [`AuthenticatedClient`] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOrigin {
    /// A service-account key document.
    ServiceAccount,
    /// A generic credentials document.
    Credentials(CredentialKind),
}

/// A reqwest client paired with a token source.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    http: reqwest::Client,
    token_source: SharedTokenSource,
    origin: ClientOrigin,
    email: Option<String>,
}

impl AuthenticatedClient {
    /// Wraps `http` so requests carry tokens from `token_source`.
    pub fn new(http: reqwest::Client, token_source: SharedTokenSource, origin: ClientOrigin) -> Self {
        Self {
            http,
            token_source,
            origin,
            email: None,
        }
    }

    /// Records the identity the client acts as.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Returns the payload shape this client came from.
    pub fn origin(&self) -> ClientOrigin {
        self.origin
    }

    /// Returns the service-account email, if known.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the underlying token source.
    pub fn token_source(&self) -> &SharedTokenSource {
        &self.token_source
    }

    /// Starts a request with the `Authorization` header already set.
    pub async fn request(&self, method: Method, url: &str) -> AuthResult<RequestBuilder> {
        let token = self.token_source.token().await?;
        Ok(self.http.request(method, url).bearer_auth(token.token))
    }

    /// Sends `builder` and decodes a JSON body, mapping HTTP failures.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, context: &str) -> AuthResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| AuthError::from_transport(context, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::from_status(status, &body).with_source_name(context.to_string()));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::invalid_response(format!("{}: invalid response body: {}", context, e)))
    }

    /// Authorized GET returning decoded JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AuthResult<T> {
        let builder = self.request(Method::GET, url).await?;
        self.send_json(builder, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;
    use crate::token::StaticTokenSource;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use std::sync::Arc;

    fn client() -> AuthenticatedClient {
        AuthenticatedClient::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenSource::new("ya29.client")),
            ClientOrigin::ServiceAccount,
        )
        .with_email("worker@sheets-lab.iam.gserviceaccount.com")
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/thing").header("authorization", "Bearer ya29.client");
            then.status(200).body(r#"{"ok": true}"#);
        });

        let value: serde_json::Value = client().get_json(&server.url("/thing")).await.unwrap();
        mock.assert();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn maps_error_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET);
            then.status(403).body("forbidden");
        });

        let err = client()
            .get_json::<serde_json::Value>(&server.url("/thing"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::AuthorizationFailed);
    }

    #[test]
    fn exposes_identity() {
        let client = client();
        assert_eq!(client.origin(), ClientOrigin::ServiceAccount);
        assert_eq!(client.email(), Some("worker@sheets-lab.iam.gserviceaccount.com"));
    }
}

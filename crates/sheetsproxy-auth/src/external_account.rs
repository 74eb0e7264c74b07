//! Workload identity federation (`external_account`) credentials.
//!
//! A subject token is read from the configured credential source (a local
//! file or a URL), exchanged at the STS endpoint for a federated access
//! token, and optionally exchanged again for a service-account token through
//! the IAM impersonation endpoint.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::token::{AccessToken, BoxFuture, TokenSource, exchange_form};

const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// An `external_account` credentials document.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalAccountConfig {
    /// Workload identity pool provider audience.
    pub audience: String,
    /// Type of the subject token, e.g. `urn:ietf:params:oauth:token-type:jwt`.
    pub subject_token_type: String,
    /// STS token endpoint.
    pub token_url: String,
    /// Where the subject token comes from.
    pub credential_source: CredentialSource,
    /// Optional IAM endpoint to impersonate a service account.
    #[serde(default)]
    pub service_account_impersonation_url: Option<String>,
    /// Project billed for quota.
    #[serde(default)]
    pub quota_project_id: Option<String>,
}

/// Location and format of a subject token.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialSource {
    /// Path of a file holding the token.
    #[serde(default)]
    pub file: Option<String>,
    /// URL returning the token.
    #[serde(default)]
    pub url: Option<String>,
    /// Extra headers for the URL source.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// How to extract the token from the file or response body.
    #[serde(default)]
    pub format: Option<SourceFormat>,
}

/// Subject token format.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceFormat {
    /// `text` or `json`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Field holding the token when `kind` is `json`.
    #[serde(default)]
    pub subject_token_field_name: Option<String>,
}

impl ExternalAccountConfig {
    /// Checks that the document describes a usable configuration.
    pub fn validate(&self) -> AuthResult<()> {
        if self.audience.is_empty() || self.token_url.is_empty() {
            return Err(AuthError::invalid_payload(
                "external_account credentials need 'audience' and 'token_url'",
            ));
        }
        match (&self.credential_source.file, &self.credential_source.url) {
            (Some(_), Some(_)) => Err(AuthError::invalid_payload(
                "credential_source must set only one of 'file' or 'url'",
            )),
            (None, None) => Err(AuthError::invalid_payload(
                "credential_source must set 'file' or 'url'",
            )),
            _ => {
                if let Some(format) = &self.credential_source.format {
                    match format.kind.as_str() {
                        "text" => {}
                        "json" if format.subject_token_field_name.is_some() => {}
                        "json" => {
                            return Err(AuthError::invalid_payload(
                                "json credential_source format needs 'subject_token_field_name'",
                            ));
                        }
                        other => {
                            return Err(AuthError::invalid_payload(format!(
                                "unsupported credential_source format \"{}\"",
                                other
                            )));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// Token source for `external_account` credentials.
#[derive(Debug)]
pub struct ExternalAccountTokenSource {
    config: ExternalAccountConfig,
    scopes: Vec<String>,
    http: reqwest::Client,
}

impl ExternalAccountTokenSource {
    /// Creates a token source for the given configuration.
    pub fn new(config: ExternalAccountConfig, scopes: &[String], http: reqwest::Client) -> Self {
        Self {
            config,
            scopes: scopes.to_vec(),
            http,
        }
    }

    async fn subject_token(&self) -> AuthResult<String> {
        let source = &self.config.credential_source;
        let raw = if let Some(path) = &source.file {
            tokio::fs::read_to_string(path).await.map_err(|e| {
                AuthError::configuration(format!("failed to read subject token file {}", path))
                    .with_source(e)
            })?
        } else if let Some(url) = &source.url {
            let mut request = self.http.get(url);
            for (name, value) in &source.headers {
                request = request.header(name, value);
            }
            let response = request
                .send()
                .await
                .map_err(|e| AuthError::from_transport("subject token request failed", e))?;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(AuthError::from_status(status, &body));
            }
            body
        } else {
            return Err(AuthError::configuration("credential_source has no file or url"));
        };

        match &source.format {
            Some(format) if format.kind == "json" => {
                let field = format.subject_token_field_name.as_deref().unwrap_or_default();
                let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
                    AuthError::invalid_response(format!("subject token is not JSON: {}", e))
                })?;
                value
                    .get(field)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AuthError::invalid_response(format!(
                            "subject token field '{}' is missing",
                            field
                        ))
                    })
            }
            _ => Ok(raw.trim().to_string()),
        }
    }

    async fn impersonate(&self, url: &str, federated: &AccessToken) -> AuthResult<AccessToken> {
        let body = serde_json::json!({
            "scope": self.scopes,
            "lifetime": "3600s",
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(&federated.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::from_transport("impersonation request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::network(format!("failed to read response: {}", e)))?;
        if !status.is_success() {
            return Err(AuthError::authentication(format!(
                "service account impersonation failed ({}): {}",
                status, body
            )));
        }

        let parsed: ImpersonationResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::invalid_response(format!("invalid impersonation response: {}", e))
        })?;
        Ok(AccessToken::with_expiry(parsed.access_token, parsed.expire_time))
    }
}

impl TokenSource for ExternalAccountTokenSource {
    fn name(&self) -> &str {
        "external-account"
    }

    fn token(&self) -> BoxFuture<'_, AuthResult<AccessToken>> {
        Box::pin(async move {
            let subject_token = self.subject_token().await?;

            // When impersonating, the federated token only needs to call IAM.
            let scope = if self.config.service_account_impersonation_url.is_some() {
                CLOUD_PLATFORM_SCOPE.to_string()
            } else {
                self.scopes.join(" ")
            };

            debug!(audience = %self.config.audience, "exchanging subject token at STS");
            let federated = exchange_form(
                &self.http,
                &self.config.token_url,
                &[
                    ("grant_type", TOKEN_EXCHANGE_GRANT),
                    ("audience", self.config.audience.as_str()),
                    ("scope", scope.as_str()),
                    ("requested_token_type", ACCESS_TOKEN_TYPE),
                    ("subject_token", subject_token.as_str()),
                    ("subject_token_type", self.config.subject_token_type.as_str()),
                ],
            )
            .await?;

            match &self.config.service_account_impersonation_url {
                Some(url) => self.impersonate(url, &federated).await,
                None => Ok(federated),
            }
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpersonationResponse {
    access_token: String,
    expire_time: DateTime<Utc>,
}

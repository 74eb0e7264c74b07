//! Token source backed by the locally configured gcloud CLI.
//!
//! Runs `gcloud config config-helper --format=json` and reads the active
//! account's access token from its output. gcloud refreshes the token
//! itself, so every call simply re-runs the helper.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::token::{AccessToken, BoxFuture, TokenSource};

/// Token source that shells out to gcloud.
#[derive(Debug, Clone)]
pub struct GcloudTokenSource {
    program: String,
}

impl Default for GcloudTokenSource {
    fn default() -> Self {
        Self::new("gcloud")
    }
}

impl GcloudTokenSource {
    /// Creates a source using the given gcloud executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run_helper(&self) -> AuthResult<String> {
        let output = Command::new(&self.program)
            .args(["config", "config-helper", "--format=json"])
            .output()
            .await
            .map_err(|e| {
                AuthError::configuration(format!("failed to run `{} config config-helper`", self.program))
                    .with_source(e)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuthError::authentication(format!(
                "`{} config config-helper` failed ({}): {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Deserialize)]
struct ConfigHelperOutput {
    credential: HelperCredential,
}

#[derive(Debug, Deserialize)]
struct HelperCredential {
    access_token: String,
    #[serde(default)]
    token_expiry: Option<DateTime<Utc>>,
}

/// Extracts the access token from config-helper JSON output.
pub(crate) fn parse_helper_output(stdout: &str) -> AuthResult<AccessToken> {
    let parsed: ConfigHelperOutput = serde_json::from_str(stdout).map_err(|e| {
        AuthError::invalid_response(format!("unexpected gcloud config-helper output: {}", e))
    })?;

    if parsed.credential.access_token.is_empty() {
        return Err(AuthError::authentication("gcloud has no active credentials"));
    }

    Ok(match parsed.credential.token_expiry {
        Some(expiry) => AccessToken::with_expiry(parsed.credential.access_token, expiry),
        None => AccessToken::new(parsed.credential.access_token, None),
    })
}

impl TokenSource for GcloudTokenSource {
    fn name(&self) -> &str {
        "gcloud"
    }

    fn token(&self) -> BoxFuture<'_, AuthResult<AccessToken>> {
        Box::pin(async move {
            debug!(program = %self.program, "reading access token from gcloud");
            let stdout = self.run_helper().await?;
            parse_helper_output(&stdout)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;

    #[test]
    fn parses_config_helper_output() {
        let stdout = r#"{
            "configuration": {"active_configuration": "default", "properties": {"core": {"project": "p"}}},
            "credential": {
                "access_token": "ya29.gcloud",
                "id_token": "eyJ...",
                "token_expiry": "2099-03-01T12:00:00Z"
            },
            "sentinels": {"config_sentinel": "/home/u/.config/gcloud/config_sentinel"}
        }"#;
        let token = parse_helper_output(stdout).unwrap();
        assert_eq!(token.token, "ya29.gcloud");
        assert!(!token.is_expired());
    }

    #[test]
    fn rejects_empty_token() {
        let stdout = r#"{"credential": {"access_token": ""}}"#;
        let err = parse_helper_output(stdout).unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::AuthenticationFailed);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_helper_output("ERROR: (gcloud) You do not currently have an active account").unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn missing_binary_is_configuration_error() {
        let source = GcloudTokenSource::new("/nonexistent/gcloud-binary-12345");
        let err = source.token().await.unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::ConfigurationError);
    }
}

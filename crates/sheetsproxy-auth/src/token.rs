//! Access tokens and the [`TokenSource`] abstraction.
//!
//! Every credential shape ends up as a token source: something that can be
//! asked for a bearer token on demand. [`CachedTokenSource`] sits in front of
//! the sources that hit the network so a token is reused until it is about
//! to expire.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// A boxed future, used for the object-safe async traits of this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Tokens are considered expired this long before their actual expiry.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// A bearer access token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The token value sent in the `Authorization` header.
    pub token: String,
    /// When the token stops being usable, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token from a token endpoint response.
    pub fn new(token: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        let expires_at = expires_in_secs
            .map(|secs| Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_BUFFER_SECS));
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Creates a token with an absolute expiry time.
    pub fn with_expiry(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(expires_at - Duration::seconds(EXPIRY_BUFFER_SECS)),
        }
    }

    /// Returns true if the token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Returns the time until the token expires, if known.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.expires_at.map(|expires_at| expires_at - Utc::now())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Something that can produce bearer tokens on demand.
pub trait TokenSource: Send + Sync + fmt::Debug {
    /// Short name of the source, used in logs and errors.
    fn name(&self) -> &str;

    /// Returns a usable access token.
    fn token(&self) -> BoxFuture<'_, AuthResult<AccessToken>>;
}

/// Shared handle to a token source.
pub type SharedTokenSource = Arc<dyn TokenSource>;

/// A token source that always returns the same token.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: AccessToken,
}

impl StaticTokenSource {
    /// Creates a source returning a token with no expiry.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token, None),
        }
    }
}

impl TokenSource for StaticTokenSource {
    fn name(&self) -> &str {
        "static"
    }

    fn token(&self) -> BoxFuture<'_, AuthResult<AccessToken>> {
        let token = self.token.clone();
        Box::pin(async move { Ok(token) })
    }
}

/// Reuses the token of an inner source until it expires.
#[derive(Debug)]
pub struct CachedTokenSource {
    inner: SharedTokenSource,
    current: Mutex<Option<AccessToken>>,
}

impl CachedTokenSource {
    /// Wraps the given source.
    pub fn new(inner: SharedTokenSource) -> Self {
        Self {
            inner,
            current: Mutex::new(None),
        }
    }

    /// Wraps the given source and returns it as a shared handle.
    pub fn shared(inner: SharedTokenSource) -> SharedTokenSource {
        Arc::new(Self::new(inner))
    }
}

impl TokenSource for CachedTokenSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn token(&self) -> BoxFuture<'_, AuthResult<AccessToken>> {
        Box::pin(async move {
            // Held across the refresh: one fetch per expiry.
            let mut current = self.current.lock().await;
            if let Some(token) = current.as_ref()
                && !token.is_expired()
            {
                return Ok(token.clone());
            }

            debug!(source = self.inner.name(), "fetching fresh access token");
            let token = self.inner.token().await?;
            *current = Some(token.clone());
            Ok(token)
        })
    }
}

/// Successful response from an OAuth 2.0 token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn into_access_token(self) -> AccessToken {
        AccessToken::new(self.access_token, self.expires_in)
    }
}

/// Posts a form to a token endpoint and parses the token response.
pub(crate) async fn exchange_form(
    http: &reqwest::Client,
    token_url: &str,
    params: &[(&str, &str)],
) -> AuthResult<AccessToken> {
    let response = http
        .post(token_url)
        .form(params)
        .send()
        .await
        .map_err(|e| AuthError::from_transport("token request failed", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AuthError::network(format!("failed to read token response: {}", e)))?;

    if !status.is_success() {
        return Err(AuthError::authentication(format!(
            "token exchange failed ({}): {}",
            status, body
        )));
    }

    let token_response: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| AuthError::invalid_response(format!("invalid token response: {}", e)))?;

    Ok(token_response.into_access_token())
}

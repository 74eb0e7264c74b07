//! The client build chain: resolve, fetch secret, interpret.

use sheetsproxy_auth::{
    AuthResult, AuthenticatedClient, CredentialResolver, GooglePayloadInterpreter,
    PayloadInterpreter, SecretFetcher, SecretManagerClient,
};
use tracing::info;

use crate::config::ServerConfig;

/// Builds the process-wide [`AuthenticatedClient`].
pub struct ClientFactory {
    resolver: CredentialResolver,
    fetcher: Box<dyn SecretFetcher>,
    interpreter: Box<dyn PayloadInterpreter>,
    secret: String,
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("resolver", &self.resolver)
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

impl ClientFactory {
    /// Creates a factory from its parts.
    pub fn new(
        resolver: CredentialResolver,
        fetcher: impl SecretFetcher + 'static,
        interpreter: impl PayloadInterpreter + 'static,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            fetcher: Box::new(fetcher),
            interpreter: Box::new(interpreter),
            secret: secret.into(),
        }
    }

    /// Creates the production chain for `config`.
    pub fn from_config(config: &ServerConfig, http: reqwest::Client) -> Self {
        let scopes = sheetsproxy_auth::scopes();
        Self::new(
            CredentialResolver::default_chain(&scopes, http.clone()),
            SecretManagerClient::with_base_url(&config.secret_manager_base_url, http.clone()),
            GooglePayloadInterpreter::new(&scopes, http),
            &config.secret,
        )
    }

    /// Runs the chain once.
    pub async fn build(&self) -> AuthResult<AuthenticatedClient> {
        let mechanism = self.resolver.resolve().await?;
        let payload = self.fetcher.fetch(&mechanism, &self.secret).await?;
        let client = self.interpreter.build_client(&payload)?;
        info!(secret = %self.secret, origin = ?client.origin(), "authenticated client ready");
        Ok(client)
    }
}

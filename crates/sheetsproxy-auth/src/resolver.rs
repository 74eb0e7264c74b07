//! Credential resolution.
//!
//! The proxy needs *some* identity to read its own secret from Secret
//! Manager. [`CredentialResolver`] tries an ordered list of
//! [`CredentialStrategy`] implementations and returns the first mechanism
//! that one of them produces:
//!
//! 1. [`DefaultCredentialsStrategy`]: ambient credential files
//!    (`GOOGLE_APPLICATION_CREDENTIALS`, gcloud's well-known ADC file)
//! 2. [`GcloudStrategy`]: the active account of the local gcloud CLI
//! 3. [`MetadataStrategy`]: the metadata server of the hosting runtime
//!
//! Nothing is cached here; every client build resolves again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::{AuthError, AuthResult};
use crate::gcloud::GcloudTokenSource;
use crate::metadata::MetadataTokenSource;
use crate::token::{BoxFuture, CachedTokenSource, SharedTokenSource};

/// Environment variable pointing at a credentials file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Environment variable overriding the gcloud configuration directory.
pub const CLOUDSDK_CONFIG_ENV: &str = "CLOUDSDK_CONFIG";

const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// How the proxy authorizes its own calls to Google APIs.
#[derive(Debug, Clone)]
pub enum AuthMechanism {
    /// Credentials bound to an identity, with the project they belong to.
    BoundCredentials {
        /// Project named by the credentials, if any.
        project_id: Option<String>,
        /// The credentials themselves.
        credentials: Credentials,
    },
    /// A bare source of bearer tokens.
    TokenSource(SharedTokenSource),
}

impl AuthMechanism {
    /// Returns the token source to authorize requests with.
    pub fn token_source(&self) -> SharedTokenSource {
        match self {
            Self::BoundCredentials { credentials, .. } => credentials.token_source.clone(),
            Self::TokenSource(source) => source.clone(),
        }
    }

    /// Returns the project id, for bound credentials that name one.
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::BoundCredentials { project_id, .. } => project_id.as_deref(),
            Self::TokenSource(_) => None,
        }
    }
}

/// One way of obtaining an [`AuthMechanism`].
pub trait CredentialStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Attempts to produce a mechanism.
    fn resolve(&self) -> BoxFuture<'_, AuthResult<AuthMechanism>>;
}

/// Ordered, first-success-wins list of strategies.
pub struct CredentialResolver {
    strategies: Vec<Box<dyn CredentialStrategy>>,
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("CredentialResolver")
            .field("strategies", &names)
            .finish()
    }
}

impl CredentialResolver {
    /// Creates a resolver that tries the given strategies in order.
    pub fn new(strategies: Vec<Box<dyn CredentialStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: ambient credentials, gcloud, metadata server.
    pub fn default_chain(scopes: &[String], http: reqwest::Client) -> Self {
        Self::new(vec![
            Box::new(DefaultCredentialsStrategy::from_env(scopes, http.clone())),
            Box::new(GcloudStrategy::default()),
            Box::new(MetadataStrategy::new(MetadataTokenSource::from_env(scopes, http))),
        ])
    }

    /// Returns the first mechanism any strategy produces.
    ///
    /// # Errors
    ///
    /// Returns a configuration error carrying the last strategy's failure
    /// when every strategy fails.
    pub async fn resolve(&self) -> AuthResult<AuthMechanism> {
        let mut last_error: Option<(String, AuthError)> = None;

        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "trying credential strategy");
            match strategy.resolve().await {
                Ok(mechanism) => {
                    match mechanism.project_id() {
                        Some(project) => info!(strategy = strategy.name(), project = %project, "found credentials"),
                        None => info!(strategy = strategy.name(), "found credentials"),
                    }
                    return Ok(mechanism);
                }
                Err(e) => {
                    debug!(strategy = strategy.name(), error = %e, "credential strategy failed");
                    last_error = Some((strategy.name().to_string(), e));
                }
            }
        }

        match last_error {
            Some((name, err)) => {
                warn!(strategy = %name, error = %err, "no credential strategy succeeded");
                Err(AuthError::configuration(format!(
                    "no credentials found (last attempt {}: {})",
                    name,
                    err.message()
                ))
                .with_source(err))
            }
            None => Err(AuthError::configuration("no credential strategies configured")),
        }
    }
}

/// Upper bound on the metadata probe of [`DefaultCredentialsStrategy`].
const METADATA_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Ambient credentials: the configured file, gcloud's well-known file, then
/// the metadata server when one is set.
#[derive(Debug)]
pub struct DefaultCredentialsStrategy {
    explicit_path: Option<PathBuf>,
    well_known_path: Option<PathBuf>,
    metadata: Option<MetadataTokenSource>,
    scopes: Vec<String>,
    http: reqwest::Client,
}

impl DefaultCredentialsStrategy {
    /// Uses `GOOGLE_APPLICATION_CREDENTIALS`, gcloud's well-known file and
    /// the metadata server.
    pub fn from_env(scopes: &[String], http: reqwest::Client) -> Self {
        let explicit_path = std::env::var_os(CREDENTIALS_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let metadata = MetadataTokenSource::from_env(scopes, http.clone());
        Self::with_paths(explicit_path, well_known_file(), scopes, http).with_metadata(metadata)
    }

    /// Uses explicit paths and no metadata server.
    pub fn with_paths(
        explicit_path: Option<PathBuf>,
        well_known_path: Option<PathBuf>,
        scopes: &[String],
        http: reqwest::Client,
    ) -> Self {
        Self {
            explicit_path,
            well_known_path,
            metadata: None,
            scopes: scopes.to_vec(),
            http,
        }
    }

    /// Falls back to `metadata` when neither file is present.
    pub fn with_metadata(mut self, metadata: MetadataTokenSource) -> Self {
        self.metadata = Some(metadata);
        self
    }

    async fn probe_metadata(&self, metadata: &MetadataTokenSource) -> AuthResult<AuthMechanism> {
        let cached = CachedTokenSource::new(Arc::new(metadata.clone()));
        tokio::time::timeout(METADATA_PROBE_TIMEOUT, crate::token::TokenSource::token(&cached))
            .await
            .map_err(|_| AuthError::configuration("metadata server did not answer"))??;
        Ok(AuthMechanism::TokenSource(Arc::new(cached)))
    }

    async fn load(&self, path: &Path) -> AuthResult<AuthMechanism> {
        let payload = tokio::fs::read(path).await.map_err(|e| {
            AuthError::configuration(format!("failed to read credentials file {}", path.display()))
                .with_source(e)
        })?;
        let credentials = Credentials::from_json(&payload, &self.scopes, self.http.clone())
            .map_err(|e| e.with_source_name(path.display().to_string()))?;
        Ok(AuthMechanism::BoundCredentials {
            project_id: credentials.project_id.clone(),
            credentials,
        })
    }
}

impl CredentialStrategy for DefaultCredentialsStrategy {
    fn name(&self) -> &str {
        "default-credentials"
    }

    fn resolve(&self) -> BoxFuture<'_, AuthResult<AuthMechanism>> {
        Box::pin(async move {
            // An explicitly configured file that is broken is an error, not
            // a reason to look elsewhere.
            if let Some(path) = &self.explicit_path {
                return self.load(path).await;
            }
            if let Some(path) = &self.well_known_path
                && path.exists()
            {
                return self.load(path).await;
            }
            if let Some(metadata) = &self.metadata {
                return self.probe_metadata(metadata).await.map_err(|e| {
                    AuthError::configuration("could not find default credentials").with_source(e)
                });
            }
            Err(AuthError::configuration("could not find default credentials"))
        })
    }
}

/// Returns the path of gcloud's application default credentials file.
pub fn well_known_file() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CLOUDSDK_CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir).join(WELL_KNOWN_FILE));
    }
    dirs::config_dir().map(|dir| dir.join("gcloud").join(WELL_KNOWN_FILE))
}

/// The local gcloud CLI.
#[derive(Debug, Default)]
pub struct GcloudStrategy {
    source: GcloudTokenSource,
}

impl GcloudStrategy {
    /// Uses the given gcloud source.
    pub fn new(source: GcloudTokenSource) -> Self {
        Self { source }
    }
}

impl CredentialStrategy for GcloudStrategy {
    fn name(&self) -> &str {
        "gcloud"
    }

    fn resolve(&self) -> BoxFuture<'_, AuthResult<AuthMechanism>> {
        Box::pin(async move {
            let source: SharedTokenSource = Arc::new(self.source.clone());
            let cached = CachedTokenSource::new(source);
            // Probe once so a missing or logged-out gcloud falls through.
            crate::token::TokenSource::token(&cached).await?;
            Ok(AuthMechanism::TokenSource(Arc::new(cached)))
        })
    }
}

/// The metadata server of the hosting runtime.
#[derive(Debug)]
pub struct MetadataStrategy {
    source: MetadataTokenSource,
}

impl MetadataStrategy {
    /// Uses the given metadata source.
    pub fn new(source: MetadataTokenSource) -> Self {
        Self { source }
    }
}

impl CredentialStrategy for MetadataStrategy {
    fn name(&self) -> &str {
        "metadata"
    }

    fn resolve(&self) -> BoxFuture<'_, AuthResult<AuthMechanism>> {
        Box::pin(async move {
            let cached = CachedTokenSource::new(Arc::new(self.source.clone()));
            crate::token::TokenSource::token(&cached).await?;
            Ok(AuthMechanism::TokenSource(Arc::new(cached)))
        })
    }
}

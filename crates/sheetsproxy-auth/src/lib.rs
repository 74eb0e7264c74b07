//! Credentials and authenticated Google API clients for the Sheets proxy.
//!
//! This crate owns everything between "the process starts with no identity"
//! and "an HTTP client that can call the Sheets API":
//!
//! - [`CredentialResolver`] - Finds ambient credentials through an ordered
//!   fallback chain of [`CredentialStrategy`] implementations
//! - [`SecretFetcher`] - Reads the proxy's own credential material from
//!   Secret Manager
//! - [`PayloadInterpreter`] - Turns that material into an
//!   [`AuthenticatedClient`]
//! - [`TokenSource`] - The token-minting abstraction every credential shape
//!   reduces to
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   AuthMechanism   ┌───────────────────┐
//! │ CredentialResolver │ ────────────────▶ │   SecretFetcher   │
//! └────────────────────┘                   └─────────┬─────────┘
//!                                                    │ payload bytes
//!                                                    ▼
//!                                          ┌────────────────────┐
//!                                          │ PayloadInterpreter │
//!                                          └─────────┬──────────┘
//!                                                    ▼
//!                                          ┌─────────────────────┐
//!                                          │ AuthenticatedClient │
//!                                          └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sheetsproxy_auth::*;
//!
//! async fn build(secret: &str) -> AuthResult<AuthenticatedClient> {
//!     let http = reqwest::Client::new();
//!     let mechanism = CredentialResolver::default_chain(&scopes(), http.clone()).resolve().await?;
//!     let payload = SecretManagerClient::new(http.clone()).fetch(&mechanism, secret).await?;
//!     GooglePayloadInterpreter::new(&scopes(), http).build_client(&payload)
//! }
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod external_account;
pub mod gcloud;
pub mod iam;
pub mod metadata;
pub mod payload;
pub mod resolver;
pub mod secrets;
pub mod service_account;
pub mod token;
pub mod userinfo;

/// OAuth scopes requested by every credential the proxy builds.
pub const SCOPES: [&str; 4] = [
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// Returns [`SCOPES`] as owned strings.
pub fn scopes() -> Vec<String> {
    SCOPES.iter().map(|s| s.to_string()).collect()
}

// Re-export main types at crate root
pub use client::{AuthenticatedClient, ClientOrigin};
pub use credentials::{CredentialKind, Credentials};
pub use error::{AuthError, AuthErrorCode, AuthResult};
pub use gcloud::GcloudTokenSource;
pub use iam::IdTokenMinter;
pub use metadata::MetadataTokenSource;
pub use payload::{GooglePayloadInterpreter, PayloadInterpreter};
pub use resolver::{
    AuthMechanism, CredentialResolver, CredentialStrategy, DefaultCredentialsStrategy,
    GcloudStrategy, MetadataStrategy,
};
pub use secrets::{SecretFetcher, SecretManagerClient};
pub use service_account::ServiceAccountKey;
pub use token::{AccessToken, BoxFuture, CachedTokenSource, SharedTokenSource, StaticTokenSource, TokenSource};
pub use userinfo::{UserInfo, fetch_user_info};

//! Subcommand implementations.

pub mod call;
pub mod config;
pub mod id_token;
pub mod serve;
pub mod whoami;

use sheetsproxy_auth::AuthenticatedClient;
use sheetsproxy_server::ClientFactory;

use crate::config::CliConfig;
use crate::error::ClientResult;

/// Builds the proxy's own authenticated client, the same way `serve` does.
pub(crate) async fn build_client(config: &CliConfig, secret_flag: Option<&str>) -> ClientResult<AuthenticatedClient> {
    let secret = config.resolve_secret(secret_flag)?;
    let server_config = config.server_config(secret);
    let http = server_config.http_client()?;
    let client = ClientFactory::from_config(&server_config, http).build().await?;
    Ok(client)
}

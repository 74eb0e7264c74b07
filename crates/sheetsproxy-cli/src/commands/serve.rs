//! Serve command: runs the proxy in the foreground.

use std::net::SocketAddr;

use tracing::info;

use crate::config::CliConfig;
use crate::error::ClientResult;

/// Starts the proxy and blocks until SIGINT/SIGTERM.
pub async fn run(config: &CliConfig, secret_flag: Option<&str>, bind: Option<SocketAddr>) -> ClientResult<()> {
    let secret = config.resolve_secret(secret_flag)?;
    let port = std::env::var("PORT").ok();
    let bind = config.resolve_bind(bind, port.as_deref())?;

    let server_config = config.server_config(secret).with_bind(bind);
    info!(bind = %bind, "starting sheets proxy");
    sheetsproxy_server::run(server_config).await?;
    Ok(())
}

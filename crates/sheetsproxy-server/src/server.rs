//! Listener lifecycle.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::ProxyResult;
use crate::handler::{AppState, router};
use crate::setup::ClientFactory;
use crate::sheets::SheetsClient;

/// Runs the proxy until SIGINT or SIGTERM.
pub async fn run(config: ServerConfig) -> ProxyResult<()> {
    config.validate()?;
    let http = config.http_client()?;
    let factory = ClientFactory::from_config(&config, http);
    let state = Arc::new(AppState::new(factory, SheetsClient::new(&config.sheets_base_url)));

    let listener = TcpListener::bind(config.bind).await?;
    let local_addr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        secret = %config.secret,
        sheets = %config.sheets_base_url,
        "sheets proxy listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("sheets proxy stopped");
    Ok(())
}

/// Resolves when the process is asked to stop.
///
/// Cloud runtimes send SIGTERM; interactive use sends SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, initiating shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refuses_invalid_config() {
        let err = run(ServerConfig::default()).await.unwrap_err();
        assert_eq!(err.category(), "config");
    }
}

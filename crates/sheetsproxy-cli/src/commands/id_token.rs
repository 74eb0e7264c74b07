//! ID token command.

use sheetsproxy_auth::IdTokenMinter;

use crate::config::CliConfig;
use crate::error::ClientResult;

/// Prints an ID token for `service_account` with `audience`.
pub async fn run(
    config: &CliConfig,
    secret_flag: Option<&str>,
    service_account: &str,
    audience: &str,
) -> ClientResult<()> {
    let client = super::build_client(config, secret_flag).await?;
    let token = IdTokenMinter::new(client)
        .generate_id_token(service_account, audience)
        .await?;
    println!("{}", token);
    Ok(())
}

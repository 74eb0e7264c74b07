//! Whoami command.

use sheetsproxy_auth::{ClientOrigin, fetch_user_info};

use crate::config::CliConfig;
use crate::error::{ClientError, ClientResult};

/// Prints the identity behind the proxy credentials.
pub async fn run(config: &CliConfig, secret_flag: Option<&str>) -> ClientResult<()> {
    let client = super::build_client(config, secret_flag).await?;

    match client.origin() {
        ClientOrigin::ServiceAccount => println!("credentials: service account"),
        ClientOrigin::Credentials(kind) => println!("credentials: {}", kind.as_str()),
    }
    if let Some(email) = client.email() {
        println!("account: {}", email);
    }

    let info = fetch_user_info(&client).await?;
    let rendered = serde_json::to_string_pretty(&info)
        .map_err(|e| ClientError::Request(format!("failed to render userinfo: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

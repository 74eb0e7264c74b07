//! Call command: invoke a deployed proxy as a service account.

use std::time::Duration;

use sheetsproxy_auth::IdTokenMinter;
use sheetsproxy_core::ValuesRequest;
use tracing::debug;

use crate::config::CliConfig;
use crate::error::{ClientError, ClientResult};

/// Arguments of the `call` command.
#[derive(Debug, Clone)]
pub struct CallArgs {
    pub url: String,
    pub service_account: String,
    pub request: ValuesRequest,
    pub timeout: Duration,
}

/// Mints an ID token for the proxy URL, posts the request and prints the
/// response.
pub async fn run(config: &CliConfig, secret_flag: Option<&str>, args: CallArgs) -> ClientResult<()> {
    let client = super::build_client(config, secret_flag).await?;
    let id_token = IdTokenMinter::new(client)
        .generate_id_token(&args.service_account, &args.url)
        .await?;

    let http = reqwest::Client::builder()
        .timeout(args.timeout)
        .build()
        .map_err(|e| ClientError::Request(format!("failed to build HTTP client: {}", e)))?;
    let response = post_values(&http, &args.url, &id_token, &args.request).await?;

    let rendered = serde_json::to_string_pretty(&response)
        .map_err(|e| ClientError::Request(format!("failed to render response: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Posts `request` to the proxy at `url` with a bearer ID token.
pub async fn post_values(
    http: &reqwest::Client,
    url: &str,
    id_token: &str,
    request: &ValuesRequest,
) -> ClientResult<serde_json::Value> {
    debug!(url = %url, "calling proxy");
    let response = http.post(url).bearer_auth(id_token).json(request).send().await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Request(format!("{} returned {}: {}", url, status, body.trim())));
    }
    serde_json::from_str(&body)
        .map_err(|e| ClientError::Request(format!("response is not JSON: {}", e)))
}

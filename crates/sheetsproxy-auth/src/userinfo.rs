//! OpenID Connect userinfo.

use serde::{Deserialize, Serialize};

use crate::client::AuthenticatedClient;
use crate::error::AuthResult;

/// Google's userinfo endpoint.
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Profile of the identity behind a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Fetches the userinfo of the identity `client` acts as.
pub async fn fetch_user_info(client: &AuthenticatedClient) -> AuthResult<UserInfo> {
    fetch_user_info_from(client, USERINFO_URL).await
}

/// Like [`fetch_user_info`], against an explicit endpoint.
pub async fn fetch_user_info_from(client: &AuthenticatedClient, url: &str) -> AuthResult<UserInfo> {
    client.get_json(url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientOrigin;
    use crate::token::StaticTokenSource;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use std::sync::Arc;

    #[tokio::test]
    async fn decodes_profile() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/oauth2/v3/userinfo").header("authorization", "Bearer ya29.me");
            then.status(200).body(
                r#"{"sub": "1098", "email": "worker@sheets-lab.iam.gserviceaccount.com",
                    "email_verified": true, "picture": "https://example.com/p.png"}"#,
            );
        });

        let client = AuthenticatedClient::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenSource::new("ya29.me")),
            ClientOrigin::ServiceAccount,
        );
        let info = fetch_user_info_from(&client, &server.url("/oauth2/v3/userinfo"))
            .await
            .unwrap();
        assert_eq!(info.sub, "1098");
        assert!(info.email_verified);
        assert_eq!(info.email.as_deref(), Some("worker@sheets-lab.iam.gserviceaccount.com"));
        assert_eq!(info.name, None);
    }
}

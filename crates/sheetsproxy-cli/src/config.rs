//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/sheetsproxy/config.toml` by default. Flags and environment
//! variables override file values.
//!
//! ```toml
//! secret = "env::SHEETS_SECRET"
//! bind = "127.0.0.1:8080"
//! timeout = 30
//!
//! [upstream]
//! sheets = "https://sheets.googleapis.com"
//! secret_manager = "https://secretmanager.googleapis.com"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sheetsproxy_server::{DEFAULT_BIND, ServerConfig};

use crate::error::{ClientError, ClientResult};

/// Configuration for the sheetsproxy CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Secret Manager version name (supports `pass::`, `env::`, `file::`).
    pub secret: Option<String>,

    /// Listen address for `serve`.
    pub bind: Option<SocketAddr>,

    /// Outbound request timeout in seconds.
    pub timeout: u64,

    /// Google API endpoints.
    #[serde(default)]
    pub upstream: UpstreamSettings,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            secret: None,
            bind: None,
            timeout: 30,
            upstream: UpstreamSettings::default(),
        }
    }
}

/// Endpoint overrides, mostly for emulators and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Sheets API base URL.
    pub sheets: Option<String>,

    /// Secret Manager base URL.
    pub secret_manager: Option<String>,
}

impl CliConfig {
    /// Loads configuration from the default path, or defaults if absent.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ClientError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetsproxy")
    }

    /// Resolves the secret name: the flag wins over the file.
    pub fn resolve_secret(&self, flag: Option<&str>) -> ClientResult<String> {
        let raw = flag.or(self.secret.as_deref()).ok_or_else(|| {
            ClientError::Config(format!(
                "no secret configured; pass --secret, set $SECRET, or add `secret = \"...\"` to {}",
                Self::default_path().display()
            ))
        })?;
        crate::secret::resolve(raw)
    }

    /// Picks the listen address: flag, then file, then `$PORT`, then the default.
    pub fn resolve_bind(&self, flag: Option<SocketAddr>, port_env: Option<&str>) -> ClientResult<SocketAddr> {
        if let Some(addr) = flag.or(self.bind) {
            return Ok(addr);
        }
        let bind = match port_env.filter(|p| !p.is_empty()) {
            Some(port) => format!("0.0.0.0:{}", port),
            None => DEFAULT_BIND.to_string(),
        };
        bind.parse()
            .map_err(|e| ClientError::Config(format!("invalid listen address '{}': {}", bind, e)))
    }

    /// Builds the server configuration for `secret`.
    pub fn server_config(&self, secret: String) -> ServerConfig {
        let mut config = ServerConfig::new(secret).with_request_timeout(Duration::from_secs(self.timeout));
        if let Some(ref url) = self.upstream.sheets {
            config = config.with_sheets_base_url(url);
        }
        if let Some(ref url) = self.upstream.secret_manager {
            config = config.with_secret_manager_base_url(url);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let config: CliConfig = toml::from_str(
            r#"
secret = "projects/p/secrets/s/versions/2"
bind = "127.0.0.1:9090"
timeout = 5

[upstream]
sheets = "http://localhost:8081"
"#,
        )
        .unwrap();

        assert_eq!(config.timeout, 5);
        assert_eq!(config.bind.unwrap().port(), 9090);

        let server = config.server_config(config.resolve_secret(None).unwrap());
        assert_eq!(server.secret, "projects/p/secrets/s/versions/2");
        assert_eq!(server.sheets_base_url, "http://localhost:8081");
        assert_eq!(server.secret_manager_base_url, "https://secretmanager.googleapis.com");
        assert_eq!(server.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.timeout, 30);
        assert!(config.secret.is_none());
        assert!(config.resolve_secret(None).is_err());
    }

    #[test]
    fn flag_overrides_file_secret() {
        let config = CliConfig {
            secret: Some("projects/p/secrets/from-file/versions/1".into()),
            ..Default::default()
        };
        let secret = config
            .resolve_secret(Some("projects/p/secrets/from-flag/versions/1"))
            .unwrap();
        assert!(secret.contains("from-flag"));
    }

    #[test]
    fn bind_precedence() {
        let config = CliConfig::default();
        assert_eq!(config.resolve_bind(None, None).unwrap().to_string(), DEFAULT_BIND);
        assert_eq!(config.resolve_bind(None, Some("9999")).unwrap().port(), 9999);
        assert!(config.resolve_bind(None, Some("not-a-port")).is_err());

        let config = CliConfig {
            bind: Some("127.0.0.1:7000".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(config.resolve_bind(None, Some("9999")).unwrap().port(), 7000);
        let flag = "127.0.0.1:6000".parse().unwrap();
        assert_eq!(config.resolve_bind(Some(flag), None).unwrap().port(), 6000);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "secret = \"env::_SHEETSPROXY_CFG_TEST\"\n").unwrap();
        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config.secret.as_deref(), Some("env::_SHEETSPROXY_CFG_TEST"));

        std::fs::write(&path, "timeout = \"soon\"\n").unwrap();
        assert!(matches!(CliConfig::load_from(&path), Err(ClientError::Config(_))));
    }
}

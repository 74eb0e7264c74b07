//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sheetsproxy_core::TracingOutputFormat;

/// sheetsproxy - read spreadsheet ranges with credentials kept in Secret Manager
#[derive(Debug, Parser)]
#[command(name = "sheetsproxy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SHEETSPROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log format (pretty, compact, json)
    #[arg(long, env = "SHEETSPROXY_LOG_FORMAT")]
    pub log_format: Option<TracingOutputFormat>,

    /// Secret Manager version holding the proxy credentials
    /// (`projects/*/secrets/*/versions/*`, or an `env::`/`pass::`/`file::` reference)
    #[arg(long, global = true, env = "SECRET")]
    pub secret: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the proxy server in the foreground
    Serve {
        /// Address to listen on (defaults to 0.0.0.0:$PORT, then 0.0.0.0:8080)
        #[arg(long, env = "SHEETSPROXY_BIND")]
        bind: Option<SocketAddr>,
    },

    /// Print an ID token minted for a service account
    IdToken {
        /// Service account to mint the token for
        #[arg(long)]
        service_account: String,

        /// Audience claim of the token
        #[arg(long)]
        audience: String,
    },

    /// Call a deployed proxy with an ID token and print the response
    Call {
        /// Proxy URL (also used as the token audience)
        #[arg(long)]
        url: String,

        /// Service account to mint the token for
        #[arg(long)]
        service_account: String,

        /// Spreadsheet identifier
        #[arg(long)]
        spreadsheet_id: String,

        /// Range in A1 notation
        #[arg(long)]
        range: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
    },

    /// Show the identity the proxy credentials belong to
    Whoami,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration file path
    Path,
}

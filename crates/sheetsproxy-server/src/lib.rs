//! Sheets proxy server.
//!
//! This crate provides the HTTP side of the proxy:
//! - A single endpoint reading a cell range through the Sheets API
//! - A process-wide authenticated client, built lazily from a secret
//! - Listener lifecycle with graceful shutdown
//!
//! # Example
//!
//! ```rust,no_run
//! use sheetsproxy_server::{ServerConfig, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("projects/my-project/secrets/sheets-key/versions/latest");
//!     run(config).await?;
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod handler;
mod server;
mod setup;
mod sheets;

pub use cache::ClientCache;
pub use config::{DEFAULT_BIND, ServerConfig};
pub use error::{ProxyError, ProxyResult};
pub use handler::{AppState, SharedState, router};
pub use server::run;
pub use setup::ClientFactory;
pub use sheets::{SHEETS_BASE_URL, SheetsClient};

//! sheetsproxy command-line interface.
//!
//! This crate provides the `sheetsproxy` binary: the server entry point and
//! a few helpers for operating a deployed proxy.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};

//! Secret reference resolver.
//!
//! The secret name may be given indirectly, in `config.toml`, `--secret` or
//! `$SECRET`:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and takes the first line
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - `file::/path` reads the file (e.g. a mounted volume) and trims it
//! - anything else is used as-is

use std::path::Path;

use crate::error::{ClientError, ClientResult};

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> ClientResult<String> {
    let resolved = if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)?
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)?
    } else if let Some(path) = value.strip_prefix("file::") {
        resolve_file(Path::new(path))?
    } else {
        value.to_string()
    };

    if resolved.trim().is_empty() {
        return Err(ClientError::Secret(format!("`{}` resolved to an empty value", value)));
    }
    Ok(resolved)
}

fn resolve_pass(path: &str) -> ClientResult<String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| ClientError::Secret(format!("failed to run `pass show {}`: {}", path, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ClientError::Secret(format!(
            "`pass show {}` failed (exit {}): {}",
            path,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(|s| s.to_string())
        .ok_or_else(|| ClientError::Secret(format!("`pass show {}` produced no output", path)))
}

fn resolve_env(var: &str) -> ClientResult<String> {
    std::env::var(var)
        .map_err(|_| ClientError::Secret(format!("environment variable `{}` is not set", var)))
}

fn resolve_file(path: &Path) -> ClientResult<String> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| ClientError::Secret(format!("failed to read {}: {}", path.display(), e)))
}

//! CLI command implementations.
//!
//! Each submodule handles one command group. Handlers print their own
//! output and return whether the command succeeded, so `main` only has to
//! turn that into an exit status.

pub mod config;
pub mod keys;
pub mod send;
pub mod subscription;

use anyhow::{Context, Result};
use std::io::Read;

use crate::models::PushOutcome;

/// Resolve an argument that holds JSON inline, `@path` to a file, or `-` for stdin.
pub fn read_json_arg(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }

    if let Some(path) = arg.strip_prefix('@') {
        let path = shellexpand::tilde(path);
        return std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path));
    }

    Ok(arg.to_string())
}

/// Print an outcome as text or pretty JSON.
pub fn print_outcome(outcome: &PushOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{outcome}");
    }
    Ok(())
}

/// Show the first few characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{head}... ({} chars)", secret.chars().count())
}

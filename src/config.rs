//! Runtime settings for the push tester.
//!
//! Settings come from `{config_dir}/settings.json` when present, then
//! environment variable overrides. This is separate from the saved VAPID
//! identity and subscription, which live in `crate::store`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};

use crate::notifications::push::DEFAULT_TTL_SECS;

/// Settings file name inside the config directory.
const SETTINGS_FILE: &str = "settings.json";

/// Runtime configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the settings and the encrypted store.
    #[serde(skip)]
    pub config_dir: PathBuf,
    /// Per-send timeout in seconds. 0 disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// TTL header sent with each push message, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ttl_secs() -> u32 {
    DEFAULT_TTL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("push-tester"),
            request_timeout_secs: default_timeout_secs(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// `PUSH_TESTER_CONFIG_DIR` overrides the platform config directory
    /// (macOS: ~/Library/Application Support/push-tester).
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(custom_dir) = std::env::var("PUSH_TESTER_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("push-tester")
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads settings from file, with environment variable overrides.
    pub fn load() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        let mut config = Self::load_from_file(&config_dir).unwrap_or_else(|e| {
            log::debug!("Using default settings: {e:#}");
            Self::default()
        });
        config.config_dir = config_dir;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_from_file(dir: &std::path::Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            anyhow::bail!("Settings file not found");
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(timeout) = lookup("PUSH_TESTER_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.trim().parse::<u64>() {
                self.request_timeout_secs = secs;
            }
        }

        if let Some(ttl) = lookup("PUSH_TESTER_TTL") {
            if let Ok(secs) = ttl.trim().parse::<u32>() {
                self.ttl_secs = secs;
            }
        }
    }

    /// The per-send timeout, if enabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.ttl_secs, 2_419_200);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> =
            [("PUSH_TESTER_TIMEOUT_SECS", "5"), ("PUSH_TESTER_TTL", " 60 ")].into();
        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.ttl_secs, 60);
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some("soon".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_settings_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), r#"{"ttl_secs": 120}"#).unwrap();

        let config = Config::load_from_file(dir.path()).unwrap();
        assert_eq!(config.ttl_secs, 120);
        assert_eq!(config.request_timeout_secs, 30);
    }
}

//! Encrypted-at-rest persistence of the saved VAPID identity and last
//! subscription.
//!
//! # Storage structure
//!
//! ```text
//! {config_dir}/push-tester-config.json
//!     { "config": { "vapid": { "publicKey": "...",
//!                              "privateKey": "<ivHex>:<cipherHex>",
//!                              "subject": "..." },
//!                   "lastSubscription": { "endpoint": "...", "keys": { ... } } } }
//! ```
//!
//! Only `vapid.privateKey` is encrypted. Callers only ever see the
//! decrypted shape.
//!
//! # Recovery
//!
//! A record that cannot be read back (undecryptable key, wrong shape,
//! corrupt file) is discarded and `load()` returns an empty config. The
//! failure is logged, never returned.

pub mod kv;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::crypto;
use crate::models::PersistedConfig;
use kv::KvStore;

/// File name of the key/value store inside the config directory.
pub const STORE_FILE_NAME: &str = "push-tester-config.json";
/// Record key holding the persisted config.
const RECORD_KEY: &str = "config";

/// Persists `PersistedConfig` with the private key encrypted.
#[derive(Debug, Clone)]
pub struct SecureConfigStore {
    kv: KvStore,
}

impl SecureConfigStore {
    /// Store inside `config_dir`, using the standard file name.
    pub fn open(config_dir: &Path) -> Self {
        Self::at(config_dir.join(STORE_FILE_NAME))
    }

    /// Store backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            kv: KvStore::new(path),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        self.kv.path()
    }

    /// Load the saved config, decrypting the private key.
    ///
    /// Never fails: an unreadable record resets the store to empty.
    pub fn load(&self) -> PersistedConfig {
        match self.try_load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[Store] Discarding saved config: {e:#}");
                if let Err(e) = self.clear() {
                    log::warn!("[Store] Failed to reset saved config: {e:#}");
                }
                PersistedConfig::default()
            }
        }
    }

    /// Replace the saved record with `config`, encrypting the private key.
    pub fn save(&self, config: &PersistedConfig) -> Result<()> {
        let mut to_save = config.clone();
        if let Some(vapid) = to_save.vapid.as_mut() {
            if !vapid.private_key.is_empty() {
                vapid.private_key = crypto::encrypt_field(&vapid.private_key)?;
            }
        }

        let value = serde_json::to_value(&to_save).context("Failed to serialize config")?;
        self.kv.set(RECORD_KEY, value)?;

        log::info!(
            "[Store] Saved config (vapid: {}, subscription: {})",
            to_save.vapid.is_some(),
            to_save.last_subscription.is_some()
        );
        Ok(())
    }

    /// Remove the saved record.
    pub fn clear(&self) -> Result<()> {
        self.kv.delete(RECORD_KEY)
    }

    fn try_load(&self) -> Result<PersistedConfig> {
        let Some(raw) = self.kv.get(RECORD_KEY)? else {
            return Ok(PersistedConfig::default());
        };

        let mut config: PersistedConfig =
            serde_json::from_value(raw).context("Saved config has an unexpected shape")?;

        if let Some(vapid) = config.vapid.as_mut() {
            if !vapid.private_key.is_empty() {
                vapid.private_key = crypto::decrypt_field(&vapid.private_key)
                    .context("Saved private key could not be decrypted")?;
            }
        }

        Ok(config)
    }
}

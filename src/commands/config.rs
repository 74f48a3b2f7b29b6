//! `config` commands: inspect, update and wipe the saved identity and
//! subscription.

use anyhow::{Context, Result};
use serde_json::json;

use super::{mask_secret, read_json_arg};
use crate::config::Config;
use crate::models::{PersistedConfig, PushSubscriptionTarget, VapidIdentity};
use crate::store::SecureConfigStore;

/// Fields accepted by `config save`.
#[derive(Debug, Default, Clone)]
pub struct SaveOptions {
    /// Full subscription JSON (inline, `@file` or `-`).
    pub subscription: Option<String>,
    /// Endpoint URL.
    pub endpoint: Option<String>,
    /// Subscription p256dh key.
    pub p256dh: Option<String>,
    /// Subscription auth secret.
    pub auth: Option<String>,
    /// VAPID public key.
    pub public_key: Option<String>,
    /// VAPID private key.
    pub private_key: Option<String>,
    /// VAPID subject.
    pub subject: Option<String>,
}

/// Print the saved config. The private key is masked unless `reveal`.
pub fn show(config: &Config, reveal: bool, json: bool) -> Result<bool> {
    let store = SecureConfigStore::open(&config.config_dir);
    let saved = store.load();

    if json {
        let mut value = serde_json::to_value(&saved)?;
        if !reveal {
            if let Some(key) = value.pointer_mut("/vapid/privateKey") {
                let masked = key.as_str().map(mask_secret).unwrap_or_default();
                *key = json!(masked);
            }
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(true);
    }

    println!("Store: {}", store.path().display());
    if saved.is_empty() {
        println!("No saved configuration.");
        return Ok(true);
    }

    match &saved.vapid {
        Some(vapid) => {
            println!("VAPID identity:");
            println!("  Public key:  {}", vapid.public_key);
            let private_key = if reveal {
                vapid.private_key.clone()
            } else {
                mask_secret(&vapid.private_key)
            };
            println!("  Private key: {private_key}");
            println!("  Subject:     {}", vapid.subject);
        }
        None => println!("VAPID identity: (none)"),
    }

    match &saved.last_subscription {
        Some(sub) => {
            println!("Last subscription:");
            println!("  Endpoint: {}", sub.endpoint);
            println!("  p256dh:   {}", sub.keys.p256dh);
            println!("  auth:     {}", sub.keys.auth);
            if let Some(expires) = sub.expiration_time {
                println!("  Expires:  {}", format_expiration(expires));
            }
        }
        None => println!("Last subscription: (none)"),
    }

    Ok(true)
}

/// Replace the saved config with exactly the given fields.
///
/// Sections with no fields given are stored as absent; nothing is merged
/// from the previous record.
pub fn save(config: &Config, options: SaveOptions) -> Result<bool> {
    let store = SecureConfigStore::open(&config.config_dir);
    let record = build_record(&options)?;

    store.save(&record)?;
    println!("Configuration saved to {}", store.path().display());
    Ok(true)
}

/// Delete the saved config.
pub fn clear(config: &Config) -> Result<bool> {
    let store = SecureConfigStore::open(&config.config_dir);
    store.clear()?;
    println!("Saved configuration cleared.");
    Ok(true)
}

/// Build the record `config save` writes.
pub fn build_record(options: &SaveOptions) -> Result<PersistedConfig> {
    let mut record = PersistedConfig::default();

    if options.public_key.is_some() || options.private_key.is_some() || options.subject.is_some()
    {
        let mut vapid = VapidIdentity::default();
        set_if_some(&mut vapid.public_key, &options.public_key);
        set_if_some(&mut vapid.private_key, &options.private_key);
        set_if_some(&mut vapid.subject, &options.subject);
        record.vapid = Some(vapid);
    }

    if let Some(arg) = &options.subscription {
        let text = read_json_arg(arg)?;
        let target = PushSubscriptionTarget::from_json(&text).context("Invalid JSON format")?;
        record.last_subscription = Some(target);
    } else if options.endpoint.is_some() || options.p256dh.is_some() || options.auth.is_some() {
        let mut target = PushSubscriptionTarget::default();
        set_if_some(&mut target.endpoint, &options.endpoint);
        set_if_some(&mut target.keys.p256dh, &options.p256dh);
        set_if_some(&mut target.keys.auth, &options.auth);
        record.last_subscription = Some(target);
    }

    Ok(record)
}

fn set_if_some(field: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

fn format_expiration(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

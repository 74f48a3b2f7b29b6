//! `keys generate`: a fresh VAPID keypair.

use anyhow::Result;
use serde_json::json;

use crate::config::Config;
use crate::models::VapidIdentity;
use crate::notifications::VapidKeys;
use crate::store::SecureConfigStore;

/// Generate and print a keypair. With `save`, the pair becomes the saved
/// identity; the saved subscription is kept.
pub fn generate(config: &Config, save: bool, subject: Option<String>, json: bool) -> Result<bool> {
    let keys = VapidKeys::generate();

    if save {
        let store = SecureConfigStore::open(&config.config_dir);
        let mut record = store.load();
        let subject = subject
            .or_else(|| record.vapid.as_ref().map(|v| v.subject.clone()))
            .unwrap_or_default();
        record.vapid = Some(VapidIdentity::new(
            keys.public_key_base64url(),
            keys.private_key_base64url(),
            subject,
        ));
        store.save(&record)?;
        log::info!("[Store] Saved generated VAPID keypair");
    }

    if json {
        let value = json!({
            "publicKey": keys.public_key_base64url(),
            "privateKey": keys.private_key_base64url(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Public key:  {}", keys.public_key_base64url());
        println!("Private key: {}", keys.private_key_base64url());
        if save {
            println!("Saved as the current VAPID identity.");
        }
    }

    Ok(true)
}

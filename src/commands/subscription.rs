//! `subscription parse`: read a browser `PushSubscription` JSON.

use anyhow::Result;

use super::{print_outcome, read_json_arg};
use crate::config::Config;
use crate::models::{PushOutcome, PushSubscriptionTarget};
use crate::store::SecureConfigStore;

/// Parse result message.
pub const PARSED_MESSAGE: &str = "Subscription parsed successfully!";
const PARSED_DETAILS: &str = "Endpoint and keys have been filled in.";
/// Parse failure message.
pub const INVALID_MESSAGE: &str = "Invalid JSON format";
const INVALID_DETAILS: &str = "Make sure the clipboard contains a valid push subscription object.";

/// Parse `input` into a target and the outcome to report.
pub fn parse(input: &str) -> (Option<PushSubscriptionTarget>, PushOutcome) {
    match PushSubscriptionTarget::from_json(input) {
        Ok(target) => {
            let outcome = PushOutcome {
                success: true,
                status_code: None,
                message: PARSED_MESSAGE.to_string(),
                details: Some(PARSED_DETAILS.to_string()),
            };
            (Some(target), outcome)
        }
        Err(e) => {
            log::debug!("Subscription parse failed: {e:#}");
            (None, PushOutcome::failure(INVALID_MESSAGE, INVALID_DETAILS))
        }
    }
}

/// Run `subscription parse`. With `save`, the parsed target replaces the
/// saved subscription and the saved identity is kept.
pub fn run(config: &Config, input: &str, save: bool, json: bool) -> Result<bool> {
    let text = read_json_arg(input)?;
    let (target, outcome) = parse(&text);

    print_outcome(&outcome, json)?;

    let Some(target) = target else {
        return Ok(false);
    };

    if !json {
        println!("  Endpoint: {}", target.endpoint);
        println!("  p256dh:   {}", target.keys.p256dh);
        println!("  auth:     {}", target.keys.auth);
    }

    if save {
        let store = SecureConfigStore::open(&config.config_dir);
        let mut record = store.load();
        record.last_subscription = Some(target);
        store.save(&record)?;
    }

    Ok(true)
}

//! `send` command: one test notification.
//!
//! Fields not given on the command line fall back to the saved config.
//! Presence checks run here before the dispatcher is involved; the
//! dispatcher repeats the key check on its own.

use anyhow::Result;
use std::time::Duration;

use super::{print_outcome, read_json_arg};
use crate::config::Config;
use crate::models::{
    NotificationPayload, PersistedConfig, PushOutcome, PushSubscriptionTarget, VapidIdentity,
};
use crate::notifications::PushDispatcher;
use crate::store::SecureConfigStore;

/// Options for `push-tester send`.
#[derive(Debug, Default, Clone)]
pub struct SendOptions {
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
    /// Notification title.
    pub title: Option<String>,
    /// Notification body.
    pub body: Option<String>,
    /// Icon URL.
    pub icon: Option<String>,
    /// Badge URL.
    pub badge: Option<String>,
    /// Notification tag.
    pub tag: Option<String>,
    /// Custom data as a JSON object.
    pub data: Option<String>,
    /// Save identity and subscription before sending.
    pub save: bool,
    /// Overrides the configured timeout (seconds, 0 disables).
    pub timeout_secs: Option<u64>,
    /// Print the outcome as JSON.
    pub json: bool,
}

/// Everything needed for one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    /// Where to send.
    pub target: PushSubscriptionTarget,
    /// Who signs.
    pub identity: VapidIdentity,
    /// What to send.
    pub payload: NotificationPayload,
}

/// Run the command. Returns whether the push was accepted.
pub async fn run(config: &Config, options: SendOptions) -> Result<bool> {
    let store = SecureConfigStore::open(&config.config_dir);
    let saved = store.load();

    let request = match build_request(&options, &saved).and_then(|r| validate(&r).map(|()| r)) {
        Ok(request) => request,
        Err(outcome) => {
            print_outcome(&outcome, options.json)?;
            return Ok(false);
        }
    };

    if options.save {
        let record = PersistedConfig {
            vapid: Some(request.identity.clone()),
            last_subscription: Some(request.target.clone()),
        };
        if let Err(e) = store.save(&record) {
            log::warn!("[Store] Failed to save config before send: {e:#}");
            eprintln!("Warning: could not save config: {e:#}");
        }
    }

    let timeout = match options.timeout_secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.request_timeout(),
    };

    let mut dispatcher = PushDispatcher::new(config.ttl_secs)?;
    if let Some(limit) = timeout {
        dispatcher = dispatcher.with_timeout(limit);
    }

    let outcome = dispatcher
        .send(&request.target, &request.identity, &request.payload)
        .await;

    print_outcome(&outcome, options.json)?;
    Ok(outcome.success)
}

/// Merge command-line options over the saved config.
pub fn build_request(
    options: &SendOptions,
    saved: &PersistedConfig,
) -> Result<SendRequest, PushOutcome> {
    let target = match &options.subscription {
        Some(arg) => {
            let text = read_json_arg(arg)
                .map_err(|e| PushOutcome::validation_error(format!("{e:#}")))?;
            PushSubscriptionTarget::from_json(&text).map_err(|e| {
                log::debug!("Subscription parse failed: {e:#}");
                PushOutcome::failure(
                    "Invalid JSON format",
                    "Make sure the input contains a valid push subscription object.",
                )
            })?
        }
        None => {
            let mut target = saved.last_subscription.clone().unwrap_or_default();
            override_field(&mut target.endpoint, options.endpoint.as_ref());
            override_field(&mut target.keys.p256dh, options.p256dh.as_ref());
            override_field(&mut target.keys.auth, options.auth.as_ref());
            target
        }
    };

    let mut identity = saved.vapid.clone().unwrap_or_default();
    override_field(&mut identity.public_key, options.public_key.as_ref());
    override_field(&mut identity.private_key, options.private_key.as_ref());
    override_field(&mut identity.subject, options.subject.as_ref());

    let mut payload = NotificationPayload::new(
        options
            .title
            .clone()
            .unwrap_or_else(|| NotificationPayload::DEFAULT_TITLE.to_string()),
        options
            .body
            .clone()
            .unwrap_or_else(|| NotificationPayload::DEFAULT_BODY.to_string()),
    )
    .with_icon(options.icon.clone().unwrap_or_default())
    .with_badge(options.badge.clone().unwrap_or_default())
    .with_tag(options.tag.clone().unwrap_or_default());

    if let Some(data) = &options.data {
        let text =
            read_json_arg(data).map_err(|e| PushOutcome::validation_error(format!("{e:#}")))?;
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Object(map)) => payload = payload.with_data(map),
            _ => {
                return Err(PushOutcome::validation_error(
                    "Custom data must be a JSON object",
                ))
            }
        }
    }

    Ok(SendRequest {
        target,
        identity,
        payload,
    })
}

/// Presence checks, in the order a user fills the form.
pub fn validate(request: &SendRequest) -> Result<(), PushOutcome> {
    let failure = if request.target.endpoint.trim().is_empty() {
        "Endpoint is required"
    } else if request.target.keys.p256dh.trim().is_empty()
        || request.target.keys.auth.trim().is_empty()
    {
        "p256dh and auth keys are required"
    } else if !request.identity.has_keys() {
        "VAPID public and private keys are required"
    } else if request.identity.subject.trim().is_empty() {
        "Subject (email) is required"
    } else if request.payload.title.trim().is_empty() {
        "Notification title is required"
    } else {
        return Ok(());
    };
    Err(PushOutcome::validation_error(failure))
}

fn override_field(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

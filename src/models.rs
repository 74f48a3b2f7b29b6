//! Data model shared by the config store, the dispatcher and the CLI.
//!
//! Field names serialize in camelCase so the persisted record keeps the
//! same JSON shape browsers use for `PushSubscription` objects.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// VAPID signing identity: keypair plus contact subject.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidIdentity {
    /// Uncompressed P-256 public key (base64url).
    pub public_key: String,
    /// P-256 private key (base64url). Encrypted at rest by the store.
    pub private_key: String,
    /// Contact URI or bare email address.
    #[serde(default)]
    pub subject: String,
}

impl VapidIdentity {
    /// Create an identity from its three parts.
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            subject: subject.into(),
        }
    }

    /// Whether both keys are present. Required for any send attempt.
    pub fn has_keys(&self) -> bool {
        !self.public_key.trim().is_empty() && !self.private_key.trim().is_empty()
    }
}

/// Client keys of a push subscription.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Browser's P-256 ECDH public key (base64url).
    #[serde(default)]
    pub p256dh: String,
    /// Shared auth secret (base64url).
    #[serde(default)]
    pub auth: String,
}

/// A browser push subscription to deliver to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionTarget {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Encryption keys.
    pub keys: SubscriptionKeys,
    /// Expiration as milliseconds since the Unix epoch, if the browser set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
}

impl PushSubscriptionTarget {
    /// Create a target without an expiration time.
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
            expiration_time: None,
        }
    }

    /// Whether endpoint and both keys are present.
    pub fn is_complete(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.keys.p256dh.trim().is_empty()
            && !self.keys.auth.trim().is_empty()
    }

    /// Parse the JSON a browser returns from `PushSubscription.toJSON()`.
    ///
    /// `endpoint` and `keys` must be present; a key missing inside `keys`
    /// becomes an empty string so the caller can report it separately.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text.trim()).context("Subscription is not valid JSON")?;

        let endpoint = value
            .get("endpoint")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .context("Subscription has no endpoint")?;
        let keys = value
            .get("keys")
            .filter(|k| k.is_object())
            .context("Subscription has no keys object")?;

        let key_field = |name: &str| {
            keys.get(name)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Self {
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: key_field("p256dh"),
                auth: key_field("auth"),
            },
            expiration_time: value
                .get("expirationTime")
                .and_then(serde_json::Value::as_f64)
                .map(|ms| ms as i64),
        })
    }
}

/// Notification content, serialized to JSON as the push message body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    /// Notification title.
    pub title: String,
    /// Notification body text.
    #[serde(default)]
    pub body: String,
    /// Icon URL (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Badge URL (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    /// Tag for notification grouping/replacement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Arbitrary data handed to the service worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl NotificationPayload {
    /// Default title used when none is given.
    pub const DEFAULT_TITLE: &'static str = "Test Notification";
    /// Default body used when none is given.
    pub const DEFAULT_BODY: &'static str = "Web push token is working! 🎉";

    /// Create a payload with a title and body.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
            badge: None,
            tag: None,
            data: None,
        }
    }

    /// Set the icon; empty strings leave it unset.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = non_empty(icon.into());
        self
    }

    /// Set the badge; empty strings leave it unset.
    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = non_empty(badge.into());
        self
    }

    /// Set the tag; empty strings leave it unset.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = non_empty(tag.into());
        self
    }

    /// Attach custom data.
    pub fn with_data(mut self, data: serde_json::Map<String, serde_json::Value>) -> Self {
        self.data = Some(data);
        self
    }
}

impl Default for NotificationPayload {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TITLE, Self::DEFAULT_BODY)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// The record kept by `SecureConfigStore`.
///
/// Always saved wholesale; there is no per-field merge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedConfig {
    /// Saved VAPID identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vapid: Option<VapidIdentity>,
    /// Subscription used by the last send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_subscription: Option<PushSubscriptionTarget>,
}

impl PersistedConfig {
    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.vapid.is_none() && self.last_subscription.is_none()
    }
}

/// Result of one send attempt, produced fresh per call and never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    /// Whether the push service accepted the message.
    pub success: bool,
    /// HTTP status from the push service, when one was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Short user-facing summary.
    pub message: String,
    /// Longer explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PushOutcome {
    /// A failure with no status code.
    pub fn failure(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: None,
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Local pre-flight failure raised before any core call.
    pub fn validation_error(details: impl Into<String>) -> Self {
        Self::failure("Validation Error", details)
    }
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = self.status_code {
            write!(f, "\n  HTTP status: {code}")?;
        }
        if let Some(details) = &self.details {
            write!(f, "\n  {details}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_from_browser_json() {
        let json = r#"{
            "endpoint": "https://fcm.googleapis.com/fcm/send/abc",
            "expirationTime": null,
            "keys": { "p256dh": "BPk...", "auth": "xyz" }
        }"#;

        let target = PushSubscriptionTarget::from_json(json).unwrap();
        assert_eq!(target.endpoint, "https://fcm.googleapis.com/fcm/send/abc");
        assert_eq!(target.keys.p256dh, "BPk...");
        assert_eq!(target.keys.auth, "xyz");
        assert_eq!(target.expiration_time, None);
        assert!(target.is_complete());
    }

    #[test]
    fn test_subscription_missing_inner_keys_default_to_empty() {
        let target = PushSubscriptionTarget::from_json(
            r#"{"endpoint": "https://push.example.com/1", "keys": {}}"#,
        )
        .unwrap();
        assert_eq!(target.keys.p256dh, "");
        assert!(!target.is_complete());
    }

    #[test]
    fn test_subscription_rejects_missing_endpoint_or_keys() {
        assert!(PushSubscriptionTarget::from_json(r#"{"keys": {"p256dh": "a", "auth": "b"}}"#).is_err());
        assert!(PushSubscriptionTarget::from_json(r#"{"endpoint": "https://x"}"#).is_err());
        assert!(PushSubscriptionTarget::from_json("not json").is_err());
    }

    #[test]
    fn test_payload_omits_absent_optionals() {
        let payload = NotificationPayload::new("Hi", "there").with_icon("").with_tag("t1");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["title"], "Hi");
        assert_eq!(json["tag"], "t1");
        assert!(json.get("icon").is_none());
        assert!(json.get("badge").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_persisted_config_uses_camel_case() {
        let config = PersistedConfig {
            vapid: None,
            last_subscription: Some(PushSubscriptionTarget::new("https://e", "p", "a")),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("lastSubscription").is_some());
        assert!(json.get("vapid").is_none());
    }

    #[test]
    fn test_vapid_identity_has_keys() {
        assert!(VapidIdentity::new("pub", "priv", "").has_keys());
        assert!(!VapidIdentity::new("pub", "  ", "a@b.com").has_keys());
        assert!(!VapidIdentity::default().has_keys());
    }
}

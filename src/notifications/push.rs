//! Single-shot web push dispatch.
//!
//! `PushDispatcher::send` performs exactly one attempt and always returns a
//! `PushOutcome`; no error escapes it. Retries, if wanted, belong to the
//! caller.
//!
//! Signing credentials are carried per call in a `SigningIdentity` value.
//! Nothing about the identity is stored on the dispatcher or in process
//! globals, so concurrent sends with different identities cannot sign with
//! each other's keys.

// Rust guideline compliant 2026-02

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::outcome::{self, PushSendError};
use super::vapid::{self, VapidKeys};
use crate::models::{NotificationPayload, PushOutcome, PushSubscriptionTarget, VapidIdentity};

/// Default message TTL: four weeks.
pub const DEFAULT_TTL_SECS: u32 = 2_419_200;

/// Subscription fields that go on the wire (endpoint + keys only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireSubscription {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Browser's P-256 ECDH public key (base64url).
    pub p256dh: String,
    /// Shared auth secret (base64url).
    pub auth: String,
}

impl From<&PushSubscriptionTarget> for WireSubscription {
    fn from(target: &PushSubscriptionTarget) -> Self {
        Self {
            endpoint: target.endpoint.trim().to_string(),
            p256dh: target.keys.p256dh.trim().to_string(),
            auth: target.keys.auth.trim().to_string(),
        }
    }
}

/// Credentials used to sign one request.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    /// Uncompressed P-256 point, base64url. Sent as the `k=` parameter.
    public_key: String,
    /// Raw 32-byte P-256 scalar, base64url.
    private_key: String,
    /// Normalized `sub` claim.
    subject: String,
}

impl SigningIdentity {
    /// Build from a VAPID identity, normalizing the keys and subject.
    ///
    /// Fails if either key is malformed or the public key is not the
    /// private key's public half.
    pub fn from_vapid(identity: &VapidIdentity) -> Result<Self> {
        let keys = VapidKeys::from_base64url(&identity.public_key, &identity.private_key)?;
        Ok(Self {
            public_key: keys.public_key_base64url().to_string(),
            private_key: keys.private_key_base64url().to_string(),
            subject: vapid::normalize_subject(&identity.subject),
        })
    }

    /// Public key (base64url), the `applicationServerKey` of the subscription.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The `sub` claim.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Raw private key scalar (base64url).
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("public_key", &self.public_key)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// Signs, encrypts and delivers one push message.
///
/// Returns the push service's status code on a 2xx response.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Send `body` to `subscription`, signed as `identity`.
    async fn send(
        &self,
        subscription: &WireSubscription,
        identity: &SigningIdentity,
        body: &[u8],
    ) -> Result<u16, PushSendError>;
}

/// `PushSender` backed by the `web-push` crate and reqwest.
///
/// `web-push` does the VAPID JWT and RFC 8291 encryption; the HTTP request
/// is built here so the response status and body stay available for
/// classification.
#[derive(Debug, Clone)]
pub struct WebPushSender {
    client: reqwest::Client,
    ttl: u32,
}

impl WebPushSender {
    /// Create a sender with its own HTTP client.
    pub fn new(ttl: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("push-tester/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, ttl))
    }

    /// Create a sender reusing an existing client (connection pooling).
    pub fn with_client(client: reqwest::Client, ttl: u32) -> Self {
        Self { client, ttl }
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(
        &self,
        subscription: &WireSubscription,
        identity: &SigningIdentity,
        body: &[u8],
    ) -> Result<u16, PushSendError> {
        use web_push::{
            ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder,
        };

        let sub_info =
            SubscriptionInfo::new(&subscription.endpoint, &subscription.p256dh, &subscription.auth);

        let mut sig_builder = VapidSignatureBuilder::from_base64(identity.private_key(), &sub_info)
            .map_err(|e| PushSendError::Signing(format!("Failed to build VAPID signature: {e}")))?;
        sig_builder.add_claim("sub", identity.subject());
        let sig = sig_builder
            .build()
            .map_err(|e| PushSendError::Signing(format!("Failed to sign VAPID JWT: {e}")))?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, body);
        builder.set_vapid_signature(sig);
        builder.set_ttl(self.ttl);

        let message = builder
            .build()
            .map_err(|e| PushSendError::Signing(format!("Failed to build web push message: {e}")))?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushSendError::Transport(format!("Web push HTTP request failed: {e}")))?;
        let status = response.status().as_u16();

        if response.status().is_success() {
            return Ok(status);
        }

        let body = response.text().await.ok().filter(|b| !b.is_empty());
        Err(PushSendError::Service { status, body })
    }
}

/// Performs one push-send attempt per call and classifies the result.
#[derive(Debug, Clone)]
pub struct PushDispatcher<S = WebPushSender> {
    sender: S,
    timeout: Option<Duration>,
}

impl PushDispatcher<WebPushSender> {
    /// Dispatcher using the real web push sender.
    pub fn new(ttl: u32) -> Result<Self> {
        Ok(Self::with_sender(WebPushSender::new(ttl)?))
    }
}

impl<S: PushSender> PushDispatcher<S> {
    /// Dispatcher over any `PushSender`.
    pub fn with_sender(sender: S) -> Self {
        Self {
            sender,
            timeout: None,
        }
    }

    /// Bound every send by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The underlying sender.
    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Send one notification and describe what happened.
    pub async fn send(
        &self,
        target: &PushSubscriptionTarget,
        identity: &VapidIdentity,
        payload: &NotificationPayload,
    ) -> PushOutcome {
        if !identity.has_keys() {
            return PushOutcome::failure(
                "Missing VAPID keys",
                "Both public and private VAPID keys are required.",
            );
        }

        if !target.is_complete() {
            return PushOutcome::failure(
                "Missing subscription fields",
                "Endpoint, p256dh and auth keys are required.",
            );
        }

        let signing = match SigningIdentity::from_vapid(identity) {
            Ok(signing) => signing,
            Err(e) => {
                log::warn!("[WebPush] Rejected VAPID identity: {e:#}");
                return outcome::classify_failure(&PushSendError::Signing(format!("{e:#}")));
            }
        };

        let subscription = WireSubscription::from(target);

        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                return outcome::classify_failure(&PushSendError::Signing(format!(
                    "Failed to serialize payload: {e}"
                )))
            }
        };

        log::info!(
            "[WebPush] Sending {} byte payload to {} as {}",
            body.len(),
            truncate_endpoint(&subscription.endpoint),
            signing.subject()
        );

        let attempt = self.sender.send(&subscription, &signing, &body);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, attempt)
                .await
                .unwrap_or(Err(PushSendError::Timeout(limit))),
            None => attempt.await,
        };

        match result {
            Ok(status) => {
                log::info!("[WebPush] Accepted with HTTP {status}");
                outcome::delivered(status)
            }
            Err(e) => {
                log::warn!("[WebPush] Send failed: {e}");
                outcome::classify_failure(&e)
            }
        }
    }
}

/// The first 48 characters of an endpoint, for logging.
fn truncate_endpoint(endpoint: &str) -> String {
    const KEEP: usize = 48;
    if endpoint.chars().count() <= KEEP {
        endpoint.to_string()
    } else {
        let head: String = endpoint.chars().take(KEEP).collect();
        format!("{head}...")
    }
}

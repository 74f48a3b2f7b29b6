//! Web push sending.
//!
//! One test notification per call, signed with the caller's VAPID
//! identity and delivered straight to the subscription's push service.
//!
//! # Flow
//!
//! ```text
//! VapidIdentity + PushSubscriptionTarget + NotificationPayload
//!     ↓ validate keys / target
//!     ↓ normalize subject, parse private key        (vapid)
//!     ↓ VAPID JWT + RFC 8291 encryption, HTTP POST  (push::WebPushSender)
//!     ↓ status / transport error
//! PushOutcome                                        (outcome)
//! ```

// Rust guideline compliant 2026-02

pub mod outcome;
pub mod push;
pub mod vapid;

pub use outcome::PushSendError;
pub use push::{PushDispatcher, PushSender, SigningIdentity, WebPushSender, WireSubscription};
pub use vapid::VapidKeys;

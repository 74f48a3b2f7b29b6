//! Push Tester - manual Web Push delivery testing.
//!
//! This crate holds a VAPID identity and a push subscription, sends one
//! signed test notification to the subscription's push service, and
//! reports what the service said.
//!
//! # Architecture
//!
//! - **Store** - Encrypted-at-rest persistence of the saved identity and
//!   last subscription (only the private key is encrypted)
//! - **Notifications** - Single-shot push dispatch and result classification
//! - **Commands** - CLI handlers; the only caller of the two above
//!
//! Neither core component returns errors to its caller: `load()` yields an
//! empty config on any stored-data problem, and `send()` always yields a
//! `PushOutcome`.
//!
//! # Modules
//!
//! - [`store`] - `SecureConfigStore` and its JSON key/value file
//! - [`crypto`] - Field encryption (`ivHex:cipherHex`)
//! - [`notifications`] - `PushDispatcher`, VAPID key handling, outcome table
//! - [`models`] - Shared data types
//! - [`config`] - Runtime settings

pub mod commands;
pub mod config;
pub mod crypto;
pub mod models;
pub mod notifications;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use models::{
    NotificationPayload, PersistedConfig, PushOutcome, PushSubscriptionTarget, SubscriptionKeys,
    VapidIdentity,
};
pub use notifications::PushDispatcher;
pub use store::SecureConfigStore;

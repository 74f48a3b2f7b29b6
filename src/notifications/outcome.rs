//! Classification of push send results into user-facing outcomes.
//!
//! Everything here is pure: no I/O, so every branch is unit-testable.

use std::fmt;
use std::time::Duration;

use crate::models::PushOutcome;

/// Message used when no fixed-table entry applies.
pub const FALLBACK_MESSAGE: &str = "Push notification failed";
/// Details used when nothing better can be extracted.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Canned message and details for a push service status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInfo {
    /// Short summary.
    pub message: &'static str,
    /// Longer explanation.
    pub details: &'static str,
}

/// Fixed lookup table keyed by HTTP status.
pub fn status_info(status: u16) -> Option<StatusInfo> {
    let (message, details) = match status {
        201 => (
            "Push notification sent successfully!",
            "The push service accepted the notification.",
        ),
        400 => (
            "Invalid request",
            "The subscription or payload format is incorrect. Check endpoint and keys.",
        ),
        401 => (
            "Unauthorized - VAPID key mismatch",
            "The VAPID public key doesn't match the one used when creating the subscription.",
        ),
        403 => (
            "Forbidden",
            "The subscription has expired or the user has revoked permission.",
        ),
        404 => (
            "Subscription not found",
            "The push subscription no longer exists. The user may have unsubscribed.",
        ),
        410 => (
            "Subscription expired",
            "This push subscription is no longer valid. Request a new subscription from the browser.",
        ),
        413 => (
            "Payload too large",
            "The notification payload exceeds the size limit (4KB).",
        ),
        429 => (
            "Too many requests",
            "You've sent too many notifications. Wait before sending more.",
        ),
        _ => return None,
    };
    Some(StatusInfo { message, details })
}

/// Why a single push send attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushSendError {
    /// The push service answered with a non-success status.
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: Option<String>,
    },
    /// The request never got a response (DNS, connect, TLS, I/O).
    Transport(String),
    /// The message could not be signed or encrypted.
    Signing(String),
    /// The attempt exceeded the caller's timeout.
    Timeout(Duration),
}

impl PushSendError {
    /// Status code, if the push service responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body, if the push service sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Service { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for PushSendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service { status, .. } => {
                write!(f, "Push service responded with HTTP {status}")
            }
            Self::Transport(msg) => write!(f, "{msg}"),
            Self::Signing(msg) => write!(f, "{msg}"),
            Self::Timeout(after) => {
                write!(f, "Push request timed out after {after:?}")
            }
        }
    }
}

impl std::error::Error for PushSendError {}

/// Outcome for an accepted message.
pub fn delivered(status: u16) -> PushOutcome {
    PushOutcome {
        success: true,
        status_code: Some(status),
        message: "✅ Push notification sent successfully!".to_string(),
        details: Some(format!(
            "Status: {status} - The notification was delivered to the push service."
        )),
    }
}

/// Outcome for a failed attempt.
///
/// Known status codes map to the fixed table; anything else falls back to
/// the most readable text available.
pub fn classify_failure(error: &PushSendError) -> PushOutcome {
    let status = error.status();

    if let Some(info) = status.and_then(status_info) {
        return PushOutcome {
            success: false,
            status_code: status,
            message: info.message.to_string(),
            details: Some(info.details.to_string()),
        };
    }

    PushOutcome {
        success: false,
        status_code: status,
        message: FALLBACK_MESSAGE.to_string(),
        details: Some(error_details(error.body(), &error.to_string())),
    }
}

/// Best-effort readable text: JSON `message`/`error`, raw body, then `fallback`.
pub fn error_details(body: Option<&str>, fallback: &str) -> String {
    match body.filter(|b| !b.is_empty()) {
        Some(body) => match serde_json::from_str::<serde_json::Value>(body) {
            Ok(json) => json_text_field(&json, "message")
                .or_else(|| json_text_field(&json, "error"))
                .unwrap_or_else(|| body.to_string()),
            Err(_) => body.to_string(),
        },
        None if fallback.is_empty() => UNKNOWN_ERROR.to_string(),
        None => fallback.to_string(),
    }
}

fn json_text_field(json: &serde_json::Value, field: &str) -> Option<String> {
    match json.get(field)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(status: u16, body: Option<&str>) -> PushSendError {
        PushSendError::Service {
            status,
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn test_table_covers_known_codes() {
        for code in [201, 400, 401, 403, 404, 410, 413, 429] {
            assert!(status_info(code).is_some(), "missing entry for {code}");
        }
        assert_eq!(status_info(500), None);
        assert_eq!(status_info(200), None);
    }

    #[test]
    fn test_410_uses_canned_texts() {
        let outcome = classify_failure(&service(410, Some("gone")));
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(410));
        assert_eq!(outcome.message, "Subscription expired");
        assert_eq!(
            outcome.details.as_deref(),
            Some("This push subscription is no longer valid. Request a new subscription from the browser.")
        );
    }

    #[test]
    fn test_401_message() {
        let outcome = classify_failure(&service(401, None));
        assert_eq!(outcome.message, "Unauthorized - VAPID key mismatch");
    }

    #[test]
    fn test_unmapped_status_prefers_json_error_field() {
        let outcome = classify_failure(&service(500, Some(r#"{"error":"oops"}"#)));
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(500));
        assert_eq!(outcome.message, FALLBACK_MESSAGE);
        assert_eq!(outcome.details.as_deref(), Some("oops"));
    }

    #[test]
    fn test_json_message_wins_over_error() {
        let details = error_details(Some(r#"{"message":"first","error":"second"}"#), "x");
        assert_eq!(details, "first");
    }

    #[test]
    fn test_json_without_known_fields_uses_raw_body() {
        let body = r#"{"reason":"nope"}"#;
        assert_eq!(error_details(Some(body), "x"), body);
    }

    #[test]
    fn test_non_json_body_is_surfaced_raw() {
        let outcome = classify_failure(&service(502, Some("Bad Gateway")));
        assert_eq!(outcome.details.as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn test_empty_body_falls_back_to_error_text() {
        let outcome = classify_failure(&service(503, Some("")));
        assert_eq!(
            outcome.details.as_deref(),
            Some("Push service responded with HTTP 503")
        );
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let outcome = classify_failure(&PushSendError::Transport("connection refused".into()));
        assert_eq!(outcome.status_code, None);
        assert_eq!(outcome.message, FALLBACK_MESSAGE);
        assert_eq!(outcome.details.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_empty_transport_error_reads_unknown() {
        let outcome = classify_failure(&PushSendError::Transport(String::new()));
        assert_eq!(outcome.details.as_deref(), Some(UNKNOWN_ERROR));
    }

    #[test]
    fn test_timeout_text() {
        let outcome = classify_failure(&PushSendError::Timeout(Duration::from_secs(5)));
        assert_eq!(outcome.details.as_deref(), Some("Push request timed out after 5s"));
    }

    #[test]
    fn test_delivered() {
        let outcome = delivered(201);
        assert!(outcome.success);
        assert_eq!(outcome.status_code, Some(201));
        assert_eq!(
            outcome.details.as_deref(),
            Some("Status: 201 - The notification was delivered to the push service.")
        );
    }
}

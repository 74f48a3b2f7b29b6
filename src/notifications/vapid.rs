//! VAPID key handling for Web Push (RFC 8292).
//!
//! Keys travel as base64url strings, the format printed by the usual
//! `generate-vapid-keys` tools. The signer wants the private key as the
//! raw 32-byte P-256 scalar, so anything else is converted (or rejected)
//! here before it can reach `web_push`.

// Rust guideline compliant 2026-02

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::rand_core::OsRng;
use serde::{Deserialize, Serialize};

/// URI schemes the push protocol accepts for the `sub` claim.
const SUBJECT_SCHEMES: [&str; 2] = ["mailto:", "https:"];

/// Return the subject as a URI, prefixing bare addresses with `mailto:`.
///
/// Scheme matching ignores ASCII case.
pub fn normalize_subject(subject: &str) -> String {
    let subject = subject.trim();
    let has_scheme = SUBJECT_SCHEMES.iter().any(|scheme| {
        subject
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if has_scheme {
        subject.to_string()
    } else {
        format!("mailto:{subject}")
    }
}

/// Decode base64url, tolerating padding and the standard alphabet.
fn decode_base64url(input: &str) -> Result<Vec<u8>> {
    let normalized: String = input
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    BASE64URL
        .decode(normalized)
        .context("Key is not valid base64url")
}

/// Parse a VAPID private key into the raw scalar form the signer expects.
///
/// Accepts a raw 32-byte scalar, SEC1 DER or PKCS#8 DER, all base64url.
/// Returns the raw scalar as unpadded base64url.
pub fn parse_private_key(private_key_b64: &str) -> Result<String> {
    let bytes = decode_base64url(private_key_b64).context("Invalid VAPID private key")?;

    let signing_key = if bytes.len() == 32 {
        SigningKey::from_bytes(bytes.as_slice().into())
            .context("VAPID private key is not a valid P-256 scalar")?
    } else if let Ok(sk) = p256::SecretKey::from_sec1_der(&bytes) {
        log::debug!("[WebPush] Converted SEC1 DER private key to raw scalar");
        SigningKey::from(sk)
    } else {
        use p256::pkcs8::DecodePrivateKey;
        let sk = SigningKey::from_pkcs8_der(&bytes).with_context(|| {
            format!(
                "VAPID private key must be a 32-byte P-256 scalar, SEC1 DER or PKCS8 DER (got {} bytes)",
                bytes.len()
            )
        })?;
        log::debug!("[WebPush] Converted PKCS8 DER private key to raw scalar");
        sk
    };

    Ok(BASE64URL.encode(signing_key.to_bytes().as_slice()))
}

/// VAPID keypair for web push authentication.
///
/// The private key is the raw 32-byte P-256 scalar (base64url). The public
/// key is the uncompressed SEC1 point (65 bytes, base64url).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VapidKeys {
    private_key_b64: String,
    public_key_b64: String,
}

impl VapidKeys {
    /// Generate a fresh VAPID keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        // SEC1 uncompressed public key (65 bytes: 0x04 || x || y)
        let public_bytes = verifying_key.to_encoded_point(false);

        Self {
            private_key_b64: BASE64URL.encode(signing_key.to_bytes().as_slice()),
            public_key_b64: BASE64URL.encode(public_bytes.as_bytes()),
        }
    }

    /// Build a keypair from user-supplied strings.
    ///
    /// The public key must be a 65-byte uncompressed P-256 point and must be
    /// the public half of the private key. The private key may be in any
    /// form `parse_private_key` accepts. Both come back normalized to
    /// unpadded base64url.
    pub fn from_base64url(public_key_b64: &str, private_key_b64: &str) -> Result<Self> {
        let public_bytes =
            decode_base64url(public_key_b64).context("Invalid VAPID public key")?;
        anyhow::ensure!(
            public_bytes.len() == 65 && public_bytes[0] == 0x04,
            "VAPID public key must be a 65-byte uncompressed P-256 point (got {} bytes)",
            public_bytes.len()
        );
        VerifyingKey::from_sec1_bytes(&public_bytes)
            .context("VAPID public key is not a point on P-256")?;

        let private_key_b64 = parse_private_key(private_key_b64)?;
        let scalar = BASE64URL
            .decode(&private_key_b64)
            .context("Invalid VAPID private key")?;
        let signing_key = SigningKey::from_bytes(scalar.as_slice().into())
            .context("VAPID private key is not a valid P-256 scalar")?;
        anyhow::ensure!(
            signing_key.verifying_key().to_encoded_point(false).as_bytes() == public_bytes.as_slice(),
            "VAPID public key does not match the private key"
        );

        Ok(Self {
            private_key_b64,
            public_key_b64: BASE64URL.encode(&public_bytes),
        })
    }

    /// Base64url-encoded uncompressed public key (the `applicationServerKey`).
    pub fn public_key_base64url(&self) -> &str {
        &self.public_key_b64
    }

    /// Base64url-encoded raw 32-byte private key scalar.
    pub fn private_key_base64url(&self) -> &str {
        &self.private_key_b64
    }
}

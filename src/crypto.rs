//! Field-level encryption for the stored VAPID private key.
//!
//! The field key is derived once per process with Argon2id from a fixed
//! passphrase and salt, so it is reproducible across runs without any
//! external key management. This hides the key from casual inspection of
//! the config file; it does not protect against a local attacker who can
//! read this binary.
//!
//! # Stored format
//!
//! ```text
//! <hex iv (16 bytes)>:<hex ciphertext + GCM tag>
//! ```
//!
//! The IV travels with the value, so a stored field can be decrypted with
//! nothing but the derived key.

// Rust guideline compliant 2026-02

use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit},
    aes::Aes256,
    AesGcm, Nonce,
};
use anyhow::{anyhow, Result};
use argon2::Argon2;
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use rand::RngCore;
use std::sync::OnceLock;
use zeroize::Zeroizing;

/// AES-256-GCM with a 16-byte IV.
type FieldCipher = AesGcm<Aes256, U16>;

/// IV size in bytes.
pub const IV_SIZE: usize = 16;
/// Derived key size in bytes.
pub const KEY_SIZE: usize = 32;
/// Separator between the hex IV and the hex ciphertext.
const SEPARATOR: char = ':';

/// Fixed derivation inputs.
const PASSPHRASE: &[u8] = b"avishek-push-tester";
const SALT: &[u8] = b"push-tester-salt";

/// Derive a key from a passphrase and salt (Argon2id, default cost).
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> Result<[u8; KEY_SIZE]> {
    let mut key = [0u8; KEY_SIZE];
    Argon2::default()
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|e| anyhow!("Key derivation failed: {e}"))?;
    Ok(key)
}

/// The process-wide field key, derived on first use.
fn field_key() -> Result<&'static [u8; KEY_SIZE]> {
    static KEY: OnceLock<[u8; KEY_SIZE]> = OnceLock::new();
    if let Some(key) = KEY.get() {
        return Ok(key);
    }
    let derived = derive_key(PASSPHRASE, SALT)?;
    Ok(KEY.get_or_init(|| derived))
}

/// Encrypt a field with the fixed application key.
pub fn encrypt_field(plaintext: &str) -> Result<String> {
    encrypt_with_key(field_key()?, plaintext)
}

/// Decrypt a stored field with the fixed application key.
///
/// Returns `None` on any malformed or undecryptable input.
pub fn decrypt_field(stored: &str) -> Option<String> {
    match field_key() {
        Ok(key) => decrypt_with_key(key, stored),
        Err(e) => {
            log::warn!("[Store] {e}");
            None
        }
    }
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
pub fn encrypt_with_key(key: &[u8; KEY_SIZE], plaintext: &str) -> Result<String> {
    let cipher =
        FieldCipher::new_from_slice(key).map_err(|e| anyhow!("Invalid key length: {e}"))?;

    let mut iv = [0u8; IV_SIZE];
    rand::rng().fill_bytes(&mut iv);

    let ciphertext = cipher
        .encrypt(Nonce::<U16>::from_slice(&iv), plaintext.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {e}"))?;

    Ok(format!(
        "{}{SEPARATOR}{}",
        HEXLOWER.encode(&iv),
        HEXLOWER.encode(&ciphertext)
    ))
}

/// Decrypt an `iv:ciphertext` string under `key`.
pub fn decrypt_with_key(key: &[u8; KEY_SIZE], stored: &str) -> Option<String> {
    let (iv_hex, ciphertext_hex) = stored.trim().split_once(SEPARATOR)?;

    let iv = HEXLOWER_PERMISSIVE.decode(iv_hex.as_bytes()).ok()?;
    if iv.len() != IV_SIZE {
        return None;
    }
    let ciphertext = HEXLOWER_PERMISSIVE.decode(ciphertext_hex.as_bytes()).ok()?;

    let cipher = FieldCipher::new_from_slice(key).ok()?;
    let mut plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::<U16>::from_slice(&iv), ciphertext.as_ref())
            .ok()?,
    );

    // Moves the buffer out; on invalid UTF-8 it comes back and is wiped.
    match String::from_utf8(std::mem::take(&mut *plaintext)) {
        Ok(text) => Some(text),
        Err(e) => {
            *plaintext = e.into_bytes();
            None
        }
    }
}

// src/crypto/encrypt.rs
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::aliases::FieldKey32;
use crate::consts::NONCE_LEN;
use crate::crypto::envelope::EncryptedField;
use crate::error::{CoreError, Result};

/// Encrypt one string value → `ENC:1:` envelope
///
/// A fresh 96-bit nonce is drawn for every call, so encrypting the same
/// plaintext twice never yields the same envelope.
pub fn encrypt(plaintext: &str, key: &FieldKey32) -> Result<EncryptedField> {
    let cipher = Aes256Gcm::new_from_slice(key.expose_secret())
        .map_err(|e| CoreError::Encryption(e.to_string()))?;

    let nonce: [u8; NONCE_LEN] = rand::random();
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CoreError::Encryption("AES-GCM seal failed".into()))?;

    Ok(EncryptedField::from_parts(&nonce, &sealed))
}

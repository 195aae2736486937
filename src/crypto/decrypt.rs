// src/crypto/decrypt.rs
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::aliases::FieldKey32;
use crate::crypto::envelope::EncryptedField;
use crate::error::{CoreError, Result};

/// Decrypt an envelope → plaintext
///
/// Wrong key, tampering and truncation all surface as `CoreError::Decryption`;
/// no partial or garbage plaintext is ever returned.
pub fn decrypt(field: &EncryptedField, key: &FieldKey32) -> Result<String> {
    let (nonce, sealed) = field.decode()?;

    let cipher = Aes256Gcm::new_from_slice(key.expose_secret())
        .map_err(|e| CoreError::Decryption(e.to_string()))?;
    let plain = cipher
        .decrypt(Nonce::from_slice(&nonce), sealed.as_slice())
        .map_err(|_| CoreError::Decryption("authentication tag mismatch".into()))?;

    String::from_utf8(plain).map_err(|_| CoreError::Decryption("plaintext is not UTF-8".into()))
}

/// Parse + decrypt a raw column value
pub fn decrypt_str(stored: &str, key: &FieldKey32) -> Result<String> {
    decrypt(&EncryptedField::parse(stored)?, key)
}

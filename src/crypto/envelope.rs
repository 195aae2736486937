// src/crypto/envelope.rs
//! `ENC:<version>:<base64(nonce ‖ ciphertext ‖ tag)>` column envelope

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::consts::{ENCRYPTED_TAG, ENVELOPE_VERSION, NONCE_LEN, TAG_LEN};
use crate::error::{CoreError, Result};

/// A structurally valid encrypted column value.
///
/// Holding one says nothing about whether it decrypts under a given key;
/// that is only known after [`crate::crypto::decrypt`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncryptedField(String);

impl EncryptedField {
    /// Build the envelope from a nonce and the AEAD output (ciphertext ‖ tag)
    pub(crate) fn from_parts(nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
        payload.extend_from_slice(nonce);
        payload.extend_from_slice(sealed);
        EncryptedField(format!(
            "{ENCRYPTED_TAG}:{ENVELOPE_VERSION}:{}",
            STANDARD.encode(payload)
        ))
    }

    /// Validate tag, version, base64 and minimum length
    pub fn parse(value: &str) -> Result<Self> {
        decode_payload(value)?;
        Ok(EncryptedField(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Split into (nonce, ciphertext ‖ tag)
    pub(crate) fn decode(&self) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
        let payload = decode_payload(&self.0)?;
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&payload[..NONCE_LEN]);
        Ok((nonce, payload[NONCE_LEN..].to_vec()))
    }
}

impl fmt::Display for EncryptedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncryptedField {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True only for a structurally complete envelope: tag, supported version,
/// valid base64 and room for nonce and tag. User text that merely starts
/// with `ENC:` is plaintext.
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_TAG) && decode_payload(value).is_ok()
}

fn decode_payload(value: &str) -> Result<Vec<u8>> {
    let mut parts = value.splitn(3, ':');

    if parts.next() != Some(ENCRYPTED_TAG) {
        return Err(CoreError::Decryption("missing ENC tag".into()));
    }

    let version: u32 = parts
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| CoreError::Decryption("malformed envelope version".into()))?;
    if version != ENVELOPE_VERSION {
        return Err(CoreError::Decryption(format!(
            "unsupported envelope version {version}"
        )));
    }

    let body = parts
        .next()
        .ok_or_else(|| CoreError::Decryption("missing payload".into()))?;
    let payload = STANDARD
        .decode(body)
        .map_err(|_| CoreError::Decryption("malformed base64 payload".into()))?;

    if payload.len() < NONCE_LEN + TAG_LEN {
        return Err(CoreError::Decryption(format!(
            "payload too short ({} bytes)",
            payload.len()
        )));
    }
    Ok(payload)
}

// src/db/cipher.rs
use crate::consts::LOCKED_PLACEHOLDER;
use crate::crypto::is_encrypted;
use crate::error::{CoreError, Result};

/// How the data-access layer turns sensitive text into stored text and back.
///
/// Implemented by [`crate::auth::AuthSession`]; the layer never sees a key.
pub trait FieldCipher: Send + Sync {
    /// Plaintext → column value. Empty strings stay empty.
    fn seal(&self, plaintext: &str) -> Result<String>;

    /// Column value → plaintext, or the locked placeholder when the value is
    /// encrypted and no key is available.
    fn open(&self, stored: &str) -> Result<String>;
}

/// Cipher for stores that never had encryption configured: writes plaintext
/// and shows any encrypted value as locked.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextCipher;

impl FieldCipher for PlaintextCipher {
    fn seal(&self, plaintext: &str) -> Result<String> {
        if plaintext == LOCKED_PLACEHOLDER {
            return Err(CoreError::LockedPlaceholderWrite);
        }
        Ok(plaintext.to_owned())
    }

    fn open(&self, stored: &str) -> Result<String> {
        if is_encrypted(stored) {
            Ok(LOCKED_PLACEHOLDER.to_owned())
        } else {
            Ok(stored.to_owned())
        }
    }
}

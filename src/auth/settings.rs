// src/auth/settings.rs
//! Persisted encryption settings
//!
//! Stored as four JSON values in the `settings` table. Salt and hash are
//! present exactly when encryption is enabled; the enum makes that hold by
//! construction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::enums::KdfMethod;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionSettings {
    Disabled { kdf_method: KdfMethod },
    Enabled(EnabledSettings),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledSettings {
    pub salt: Vec<u8>,
    pub key_hash: [u8; 32],
    pub kdf_method: KdfMethod,
}

impl EncryptionSettings {
    pub fn is_enabled(&self) -> bool {
        matches!(self, EncryptionSettings::Enabled(_))
    }

    pub fn kdf_method(&self) -> KdfMethod {
        match self {
            EncryptionSettings::Disabled { kdf_method } => *kdf_method,
            EncryptionSettings::Enabled(s) => s.kdf_method,
        }
    }
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        EncryptionSettings::Disabled {
            kdf_method: KdfMethod::default(),
        }
    }
}

impl EnabledSettings {
    pub fn salt_b64(&self) -> String {
        STANDARD.encode(&self.salt)
    }

    pub fn key_hash_b64(&self) -> String {
        STANDARD.encode(self.key_hash)
    }

    /// Rebuild from the base64 strings kept in the settings table
    pub fn from_b64(salt: &str, key_hash: &str, kdf_method: KdfMethod) -> Result<Self> {
        let salt = STANDARD
            .decode(salt)
            .map_err(|e| CoreError::Validation(format!("encryption_salt: {e}")))?;
        if salt.is_empty() {
            return Err(CoreError::Validation("encryption_salt is empty".into()));
        }
        let hash = STANDARD
            .decode(key_hash)
            .map_err(|e| CoreError::Validation(format!("encryption_key_hash: {e}")))?;
        let key_hash: [u8; 32] = hash.try_into().map_err(|v: Vec<u8>| {
            CoreError::Validation(format!("encryption_key_hash is {} bytes, expected 32", v.len()))
        })?;
        Ok(EnabledSettings {
            salt,
            key_hash,
            kdf_method,
        })
    }
}

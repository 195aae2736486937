// src/aliases.rs
//! Secret wrapper types built on secrecy
//!
//! Everything that holds key material or a password goes through one of
//! these wrappers so it is zeroized on drop and redacted in `Debug`.

use secrecy::{ExposeSecret, SecretBox, SecretString};

/// 256-bit AES-GCM field key derived from the master password
#[derive(Debug)]
pub struct FieldKey32(SecretBox<[u8; 32]>);

impl FieldKey32 {
    pub fn new(bytes: [u8; 32]) -> Self {
        FieldKey32(SecretBox::new(Box::new(bytes)))
    }

    pub fn expose_secret(&self) -> &[u8; 32] {
        self.0.expose_secret()
    }
}

/// User-entered master password, never persisted
#[derive(Debug)]
pub struct MasterPassword(SecretString);

impl MasterPassword {
    pub fn new(password: String) -> Self {
        MasterPassword(SecretString::from(password))
    }

    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

// src/error.rs
//! Public error type for the entire crate

use thiserror::Error;

/// Why an authentication step was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid password")]
    InvalidPassword,

    #[error("encryption is not configured")]
    NotConfigured,

    #[error("encryption is already configured")]
    AlreadyConfigured,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Re-encryption aborted, nothing was changed: {0}")]
    Reencryption(#[source] Box<CoreError>),

    #[error("Refusing to store the locked placeholder; unlock first")]
    LockedPlaceholderWrite,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Worker(String),
}

impl CoreError {
    /// True when the failure was a wrong password rather than anything structural
    pub fn is_invalid_password(&self) -> bool {
        matches!(self, CoreError::Auth(AuthError::InvalidPassword))
    }
}

impl From<tokio::task::JoinError> for CoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        CoreError::Worker(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

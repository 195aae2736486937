// src/crypto/mod.rs
//! Field-level cryptography
//!
//! - `kdf`: master password → 256-bit field key, plus the key verification hash
//! - `envelope`: the `ENC:<version>:<base64>` column format
//! - `encrypt` / `decrypt`: AES-256-GCM over single string values
//!
//! Nothing in here knows about lock state or storage; callers pass the key
//! explicitly.

pub mod decrypt;
pub mod encrypt;
pub mod envelope;
pub mod kdf;

pub use decrypt::{decrypt, decrypt_str};
pub use encrypt::encrypt;
pub use envelope::{is_encrypted, EncryptedField};
pub use kdf::{derive_key, derive_key_with, generate_salt, key_hash, verify_key, KdfParams};

// src/crypto/kdf.rs
//! Password-based key derivation and key verification
//!
//! Argon2id is the default; PBKDF2-HMAC-SHA256 stays available for vaults
//! that were set up with it. The derived key never touches disk. Only an
//! HMAC of a fixed context under the key is persisted, so a candidate key
//! can be checked without storing anything that decrypts data.

use argon2::{Algorithm, Argon2, Params, Version};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroize;

use crate::aliases::{FieldKey32, MasterPassword};
use crate::consts::{
    ARGON2_MEMORY_COST_KIB, ARGON2_PARALLELISM, ARGON2_TIME_COST, KEY_CHECK_CONTEXT, KEY_LEN,
    PBKDF2_ITERATIONS, SALT_LEN,
};
use crate::enums::KdfMethod;
use crate::error::{CoreError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Cost parameters for both KDFs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub argon2_time_cost: u32,
    pub argon2_memory_kib: u32,
    pub argon2_parallelism: u32,
    pub pbkdf2_iterations: u32,
}

impl KdfParams {
    pub const PRODUCTION: KdfParams = KdfParams {
        argon2_time_cost: ARGON2_TIME_COST,
        argon2_memory_kib: ARGON2_MEMORY_COST_KIB,
        argon2_parallelism: ARGON2_PARALLELISM,
        pbkdf2_iterations: PBKDF2_ITERATIONS,
    };

    /// Cheap profile for development and tests (`features.skip_kdf_slowdown`).
    /// Keys derived with it are NOT interchangeable with production keys.
    pub const fn fast() -> Self {
        KdfParams {
            argon2_time_cost: 1,
            argon2_memory_kib: 1_024,
            argon2_parallelism: 1,
            pbkdf2_iterations: 1_000,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::PRODUCTION
    }
}

/// Fresh random salt for a new master password
pub fn generate_salt() -> [u8; SALT_LEN] {
    rand::random()
}

/// Derive the field key with production cost parameters
pub fn derive_key(password: &MasterPassword, salt: &[u8], method: KdfMethod) -> Result<FieldKey32> {
    derive_key_with(password, salt, method, &KdfParams::PRODUCTION)
}

/// Derive the field key with explicit cost parameters. Deterministic for a
/// given (password, salt, method, params).
pub fn derive_key_with(
    password: &MasterPassword,
    salt: &[u8],
    method: KdfMethod,
    params: &KdfParams,
) -> Result<FieldKey32> {
    let mut out = [0u8; KEY_LEN];
    let pw = password.expose_secret().as_bytes();

    match method {
        KdfMethod::Argon2id => {
            let argon_params = Params::new(
                params.argon2_memory_kib,
                params.argon2_time_cost,
                params.argon2_parallelism,
                Some(KEY_LEN),
            )
            .map_err(|e| CoreError::KeyDerivation(e.to_string()))?;

            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
                .hash_password_into(pw, salt, &mut out)
                .map_err(|e| CoreError::KeyDerivation(e.to_string()))?;
        }
        KdfMethod::Pbkdf2 => {
            if salt.is_empty() {
                return Err(CoreError::KeyDerivation("empty salt".into()));
            }
            pbkdf2::pbkdf2_hmac::<Sha256>(pw, salt, params.pbkdf2_iterations, &mut out);
        }
    }

    debug!(%method, "derived field key");
    let key = FieldKey32::new(out);
    out.zeroize();
    Ok(key)
}

fn key_mac(key: &FieldKey32) -> Result<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.expose_secret())
        .map_err(|e| CoreError::KeyDerivation(e.to_string()))?;
    mac.update(KEY_CHECK_CONTEXT);
    Ok(mac)
}

/// Verification hash persisted next to the salt
pub fn key_hash(key: &FieldKey32) -> Result<[u8; 32]> {
    let tag = key_mac(key)?.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&tag);
    Ok(out)
}

/// Constant-time check of `key` against a stored verification hash
pub fn verify_key(key: &FieldKey32, stored_hash: &[u8]) -> bool {
    match key_mac(key) {
        Ok(mac) => mac.verify_slice(stored_hash).is_ok(),
        Err(_) => false,
    }
}

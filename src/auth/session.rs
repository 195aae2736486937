// src/auth/session.rs
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::aliases::{FieldKey32, MasterPassword};
use crate::auth::settings::{EnabledSettings, EncryptionSettings};
use crate::config::Config;
use crate::consts::LOCKED_PLACEHOLDER;
use crate::crypto::{
    decrypt_str, derive_key_with, encrypt, generate_salt, is_encrypted, key_hash, verify_key,
    KdfParams,
};
use crate::db::{Database, FieldCipher, ResealReport};
use crate::enums::{AuthState, KdfMethod};
use crate::error::{AuthError, CoreError, Result};

/// Owns the derived key and the vault's lock state.
///
/// Key-changing operations (`setup`, `unlock`, `lock`, `change_password`,
/// `disable_encryption`) are serialized by a single-writer async mutex.
/// The key itself sits behind a std `RwLock` that is never held across an
/// `.await`, so `FieldCipher` calls stay synchronous.
pub struct AuthSession {
    db: Arc<Database>,
    kdf_params: KdfParams,
    /// KDF for the next `setup`
    setup_method: KdfMethod,
    settings: RwLock<EncryptionSettings>,
    key: RwLock<Option<FieldKey32>>,
    writer: Mutex<()>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn copy_key(key: &FieldKey32) -> FieldKey32 {
    FieldKey32::new(*key.expose_secret())
}

impl AuthSession {
    /// Read persisted settings; start `NotConfigured` or `Locked`
    pub async fn load(db: Arc<Database>, kdf_params: KdfParams) -> Result<Self> {
        let settings = db.load_encryption_settings().await?;
        info!(enabled = settings.is_enabled(), kdf = %settings.kdf_method(), "auth session loaded");
        Ok(AuthSession {
            db,
            kdf_params,
            setup_method: settings.kdf_method(),
            settings: RwLock::new(settings),
            key: RwLock::new(None),
            writer: Mutex::new(()),
        })
    }

    /// Load with the KDF cost profile and setup method from `config`
    pub async fn from_config(db: Arc<Database>, config: &Config) -> Result<Self> {
        Ok(Self::load(db, config.kdf_params())
            .await?
            .with_setup_method(config.security.kdf_method))
    }

    /// KDF used by a later [`AuthSession::setup`]; an existing vault keeps its own
    pub fn with_setup_method(mut self, method: KdfMethod) -> Self {
        self.setup_method = method;
        self
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn state(&self) -> AuthState {
        if !read(&self.settings).is_enabled() {
            AuthState::NotConfigured
        } else if read(&self.key).is_some() {
            AuthState::Unlocked
        } else {
            AuthState::Locked
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.state() == AuthState::Unlocked
    }

    pub fn kdf_method(&self) -> KdfMethod {
        read(&self.settings).kdf_method()
    }

    pub fn settings(&self) -> EncryptionSettings {
        read(&self.settings).clone()
    }

    fn enabled_settings(&self) -> Result<EnabledSettings> {
        match &*read(&self.settings) {
            EncryptionSettings::Enabled(s) => Ok(s.clone()),
            EncryptionSettings::Disabled { .. } => Err(AuthError::NotConfigured.into()),
        }
    }

    async fn derive(
        &self,
        password: MasterPassword,
        salt: Vec<u8>,
        method: KdfMethod,
    ) -> Result<FieldKey32> {
        let params = self.kdf_params;
        tokio::task::spawn_blocking(move || derive_key_with(&password, &salt, method, &params))
            .await?
    }

    /// Derive from the stored salt and check against the stored hash
    async fn derive_verified(
        &self,
        password: MasterPassword,
        stored: &EnabledSettings,
    ) -> Result<FieldKey32> {
        let key = self
            .derive(password, stored.salt.clone(), stored.kdf_method)
            .await?;
        if verify_key(&key, &stored.key_hash) {
            Ok(key)
        } else {
            warn!("master password rejected");
            Err(AuthError::InvalidPassword.into())
        }
    }

    fn install(&self, key: Option<FieldKey32>, settings: EncryptionSettings) {
        *write(&self.key) = key;
        *write(&self.settings) = settings;
    }

    /// NotConfigured → Unlocked, using the configured KDF method
    pub async fn setup(&self, password: MasterPassword) -> Result<()> {
        self.setup_with_method(password, self.setup_method).await
    }

    /// NotConfigured → Unlocked. Plaintext already in the store is sealed
    /// under the new key in the same transaction that stores the settings.
    pub async fn setup_with_method(&self, password: MasterPassword, method: KdfMethod) -> Result<()> {
        let _writer = self.writer.lock().await;
        if read(&self.settings).is_enabled() {
            return Err(AuthError::AlreadyConfigured.into());
        }

        let salt = generate_salt();
        let key = self.derive(password, salt.to_vec(), method).await?;
        let settings = EncryptionSettings::Enabled(EnabledSettings {
            salt: salt.to_vec(),
            key_hash: key_hash(&key)?,
            kdf_method: method,
        });

        let installed = copy_key(&key);
        let committed = settings.clone();
        let report = self
            .db
            .reseal_all(
                |value| {
                    if is_encrypted(value) {
                        warn!("found a value encrypted under an unknown key during setup; left as is");
                        Ok(value.to_owned())
                    } else {
                        Ok(encrypt(value, &key)?.into_string())
                    }
                },
                &settings,
                move || self.install(Some(installed), committed),
            )
            .await?;

        info!(%method, sealed = report.values_rewritten, "encryption set up");
        Ok(())
    }

    /// Locked → Unlocked. A wrong password leaves the state untouched.
    pub async fn unlock(&self, password: MasterPassword) -> Result<()> {
        let _writer = self.writer.lock().await;
        let stored = self.enabled_settings()?;
        let key = self.derive_verified(password, &stored).await?;
        *write(&self.key) = Some(key);
        info!("vault unlocked");
        Ok(())
    }

    /// Unlocked → Locked. Idempotent; does nothing when not configured.
    pub async fn lock(&self) {
        let _writer = self.writer.lock().await;
        if write(&self.key).take().is_some() {
            info!("vault locked");
        } else {
            debug!(state = %self.state(), "lock requested, no key held");
        }
    }

    /// Verify `old`, derive a fresh salt and key from `new`, re-encrypt every
    /// sensitive value and swap settings and key atomically. Works from
    /// Locked as well; the session ends Unlocked under the new key.
    ///
    /// On any failure nothing persisted changes and the previous key (if
    /// one was held) stays active.
    pub async fn change_password(&self, old: MasterPassword, new: MasterPassword) -> Result<ResealReport> {
        let _writer = self.writer.lock().await;
        let stored = self.enabled_settings()?;
        let old_key = self.derive_verified(old, &stored).await?;

        let salt = generate_salt();
        let new_key = self.derive(new, salt.to_vec(), stored.kdf_method).await?;
        let settings = EncryptionSettings::Enabled(EnabledSettings {
            salt: salt.to_vec(),
            key_hash: key_hash(&new_key)?,
            kdf_method: stored.kdf_method,
        });

        let installed = copy_key(&new_key);
        let committed = settings.clone();
        let report = self
            .db
            .reseal_all(
                |value| {
                    let plain = if is_encrypted(value) {
                        decrypt_str(value, &old_key)?
                    } else {
                        value.to_owned()
                    };
                    Ok(encrypt(&plain, &new_key)?.into_string())
                },
                &settings,
                move || self.install(Some(installed), committed),
            )
            .await?;

        info!(rewritten = report.values_rewritten, "master password changed");
        Ok(report)
    }

    /// Any configured state → NotConfigured. Every sensitive value is stored
    /// as plaintext again and the salt and hash are removed.
    pub async fn disable_encryption(&self, password: MasterPassword) -> Result<ResealReport> {
        let _writer = self.writer.lock().await;
        let stored = self.enabled_settings()?;
        let key = self.derive_verified(password, &stored).await?;

        let settings = EncryptionSettings::Disabled {
            kdf_method: stored.kdf_method,
        };
        let committed = settings.clone();
        let report = self
            .db
            .reseal_all(
                |value| {
                    if is_encrypted(value) {
                        decrypt_str(value, &key)
                    } else {
                        Ok(value.to_owned())
                    }
                },
                &settings,
                move || self.install(None, committed),
            )
            .await?;

        info!(decrypted = report.values_rewritten, "encryption disabled");
        Ok(report)
    }

    /// For display: plaintext passes through, encrypted values decrypt or
    /// show as `[Locked]`. Never returns the raw envelope.
    pub fn decrypt_or_placeholder(&self, value: &str) -> String {
        if !is_encrypted(value) {
            return value.to_owned();
        }
        match &*read(&self.key) {
            None => LOCKED_PLACEHOLDER.to_owned(),
            Some(key) => decrypt_str(value, key).unwrap_or_else(|e| {
                warn!(error = %e, "stored value did not decrypt");
                LOCKED_PLACEHOLDER.to_owned()
            }),
        }
    }
}

impl FieldCipher for AuthSession {
    fn seal(&self, plaintext: &str) -> Result<String> {
        if plaintext == LOCKED_PLACEHOLDER {
            return Err(CoreError::LockedPlaceholderWrite);
        }
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        match &*read(&self.key) {
            Some(key) => Ok(encrypt(plaintext, key)?.into_string()),
            None => Ok(plaintext.to_owned()),
        }
    }

    fn open(&self, stored: &str) -> Result<String> {
        if !is_encrypted(stored) {
            return Ok(stored.to_owned());
        }
        match &*read(&self.key) {
            Some(key) => decrypt_str(stored, key),
            None => Ok(LOCKED_PLACEHOLDER.to_owned()),
        }
    }
}

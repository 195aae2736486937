// src/auth/mod.rs
//! Lock state machine and key ownership
//!
//! `AuthSession` is the only owner of the in-memory field key. Everything
//! else gets at encryption through its [`crate::db::FieldCipher`] impl.

mod session;
pub mod settings;
pub mod worker;

pub use session::AuthSession;
pub use settings::{EnabledSettings, EncryptionSettings};
pub use worker::{spawn_auth_worker, AuthCommand, AuthHandle};

// src/db/mod.rs
//! Encrypted data-access layer
//!
//! One SQLite connection behind an async mutex. Sensitive text columns
//! (`tasks.title`, `tasks.notes`, `projects.name`, `daily_notes.content`)
//! are sealed and opened through a [`FieldCipher`] passed into every call,
//! always while the connection is held, so a re-key that swaps the key
//! under the same lock can never pair rows and keys from different
//! generations.
//!
//! Encrypted columns are never used in a SQL predicate: AES-GCM with a fresh
//! nonce gives identical plaintexts different ciphertexts. Lookups by an
//! encrypted value fetch on the plain predicates, open in memory, then filter.

mod cipher;
mod conn;
mod notes;
mod notifications;
mod projects;
mod reseal;
mod settings;
mod tasks;

pub use cipher::{FieldCipher, PlaintextCipher};
pub use conn::Database;
pub use reseal::{ResealReport, ENCRYPTED_COLUMNS};

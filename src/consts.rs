// src/consts.rs
//! Shared constants — security parameters, storage keys and defaults

/// Argon2id passes
pub const ARGON2_TIME_COST: u32 = 3;

/// Argon2id memory in KiB (64 MiB)
pub const ARGON2_MEMORY_COST_KIB: u32 = 65_536;

/// Argon2id lanes
pub const ARGON2_PARALLELISM: u32 = 4;

/// PBKDF2-HMAC-SHA256 iterations for the fallback KDF
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Derived key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Random salt length in bytes
pub const SALT_LEN: usize = 32;

/// AES-GCM nonce length (96 bits)
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Format tag that opens every encrypted column value
pub const ENCRYPTED_TAG: &str = "ENC";

/// Envelope version written by this crate
pub const ENVELOPE_VERSION: u32 = 1;

/// Context string MACed under the derived key to produce the verification hash
pub const KEY_CHECK_CONTEXT: &[u8] = b"task-vault-key-verification-v1";

/// What readers see in place of an encrypted value while the vault is locked
pub const LOCKED_PLACEHOLDER: &str = "[Locked]";

// Settings table keys
pub const SETTING_ENCRYPTION_ENABLED: &str = "encryption_enabled";
pub const SETTING_ENCRYPTION_SALT: &str = "encryption_salt";
pub const SETTING_KEY_HASH: &str = "encryption_key_hash";
pub const SETTING_KDF_METHOD: &str = "encryption_kdf_method";

/// Hour of day a bare due date refers to when planning reminders
pub const DEFAULT_DUE_HOUR: u32 = 9;

/// Default reminder lead time in minutes
pub const DEFAULT_REMINDER_OFFSET_MINUTES: u32 = 60;

/// How often the reminder loop looks for due notifications
pub const DEFAULT_REMINDER_POLL_SECS: u64 = 30;

/// SQLite busy timeout
pub const DB_BUSY_TIMEOUT_MS: u64 = 5_000;

// src/config/mod.rs
//! Configuration for task-vault
//!
//! Lazy-loaded global config from TOML, with `TV_*` env overrides, plus
//! explicit constructors for callers that manage their own config.

pub use app::{load, Config, Features, Paths, Reminders, Security};
pub use defaults::{DEFAULT_CONFIG_FILE, ENV_CONFIG, ENV_DB};

mod app;
mod defaults;

// tests/common.rs
//! Shared test utilities — logging setup plus a fast in-memory vault
#![allow(dead_code)]

use std::sync::Arc;

use task_vault::{AuthSession, Database, KdfParams, MasterPassword};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize test-friendly logging
/// Call once at the start of any test that needs logs
pub fn setup() {
    #[cfg(feature = "logging")]
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

pub fn pw(s: &str) -> MasterPassword {
    MasterPassword::new(s.to_owned())
}

pub fn memory_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().unwrap())
}

/// Fresh in-memory store + session on the cheap KDF profile
pub async fn fresh_session() -> (Arc<Database>, Arc<AuthSession>) {
    setup();
    let db = memory_db();
    let session = AuthSession::load(Arc::clone(&db), KdfParams::fast())
        .await
        .unwrap();
    (db, Arc::new(session))
}

/// Same, already set up (and therefore unlocked) with `password`
pub async fn unlocked_session(password: &str) -> (Arc<Database>, Arc<AuthSession>) {
    let (db, session) = fresh_session().await;
    session.setup(pw(password)).await.unwrap();
    (db, session)
}

pub fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

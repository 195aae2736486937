// tests/auth_tests.rs
mod common;
use common::{date, fresh_session, pw, unlocked_session};

use std::sync::Arc;

use task_vault::consts::LOCKED_PLACEHOLDER;
use task_vault::crypto::{encrypt, is_encrypted};
use task_vault::enums::{AuthState, KdfMethod};
use task_vault::error::{AuthError, CoreError};
use task_vault::models::{Project, Task, TaskFilter};
use task_vault::{AuthSession, Config, FieldKey32, KdfParams};

#[tokio::test]
async fn test_starts_not_configured() {
    let (_db, session) = fresh_session().await;
    assert_eq!(session.state(), AuthState::NotConfigured);
    assert!(matches!(
        session.unlock(pw("x")).await,
        Err(CoreError::Auth(AuthError::NotConfigured))
    ));
}

#[tokio::test]
async fn test_setup_unlocks_and_persists_settings() {
    let (db, session) = unlocked_session("correct horse").await;
    assert_eq!(session.state(), AuthState::Unlocked);

    let settings = db.load_encryption_settings().await.unwrap();
    assert!(settings.is_enabled());
    assert_eq!(settings.kdf_method(), KdfMethod::Argon2id);
    assert_eq!(db.get_setting::<bool>("encryption_enabled").await.unwrap(), Some(true));
    assert!(db.get_setting::<String>("encryption_salt").await.unwrap().is_some());
    assert!(db.get_setting::<String>("encryption_key_hash").await.unwrap().is_some());

    assert!(matches!(
        session.setup(pw("again")).await,
        Err(CoreError::Auth(AuthError::AlreadyConfigured))
    ));
}

#[tokio::test]
async fn test_reload_starts_locked() {
    let (db, session) = unlocked_session("pw").await;
    drop(session);

    let reloaded = AuthSession::load(Arc::clone(&db), KdfParams::fast()).await.unwrap();
    assert_eq!(reloaded.state(), AuthState::Locked);
    reloaded.unlock(pw("pw")).await.unwrap();
    assert_eq!(reloaded.state(), AuthState::Unlocked);
}

#[tokio::test]
async fn test_wrong_password_keeps_locked() {
    let (_db, session) = unlocked_session("pw").await;
    session.lock().await;

    let err = session.unlock(pw("nope")).await.unwrap_err();
    assert!(err.is_invalid_password());
    assert_eq!(session.state(), AuthState::Locked);

    session.unlock(pw("pw")).await.unwrap();
    assert_eq!(session.state(), AuthState::Unlocked);
}

#[tokio::test]
async fn test_lock_is_idempotent() {
    let (_db, session) = unlocked_session("pw").await;
    session.lock().await;
    assert_eq!(session.state(), AuthState::Locked);
    session.lock().await;
    assert_eq!(session.state(), AuthState::Locked);

    let (_db, fresh) = fresh_session().await;
    fresh.lock().await;
    assert_eq!(fresh.state(), AuthState::NotConfigured);
}

#[tokio::test]
async fn test_decrypt_or_placeholder() {
    let (db, session) = unlocked_session("pw").await;
    let id = db.save_task(&*session, &Task::new("Dentist")).await.unwrap();
    let raw = db.raw_value("tasks", "title", id).await.unwrap().unwrap();

    assert_eq!(session.decrypt_or_placeholder(&raw), "Dentist");
    assert_eq!(session.decrypt_or_placeholder("plain"), "plain");

    let foreign = encrypt("other", &FieldKey32::new([1; 32])).unwrap();
    assert_eq!(session.decrypt_or_placeholder(foreign.as_str()), LOCKED_PLACEHOLDER);

    session.lock().await;
    assert_eq!(session.decrypt_or_placeholder(&raw), LOCKED_PLACEHOLDER);
}

#[tokio::test]
async fn test_setup_seals_existing_plaintext() {
    let (db, session) = fresh_session().await;
    let id = db.save_task(&*session, &Task::new("Written before setup")).await.unwrap();
    db.save_project(
        &*session,
        &Project { id: "p".into(), name: "Home".into(), icon: "h".into(), color: "blue".into() },
    )
    .await
    .unwrap();
    db.save_daily_note(&*session, date(2026, 1, 1), "dear diary").await.unwrap();
    assert_eq!(
        db.raw_value("tasks", "title", id).await.unwrap().as_deref(),
        Some("Written before setup")
    );

    session.setup(pw("pw")).await.unwrap();

    assert!(is_encrypted(&db.raw_value("tasks", "title", id).await.unwrap().unwrap()));
    assert!(is_encrypted(&db.raw_value("projects", "name", 1).await.unwrap().unwrap()));
    assert!(is_encrypted(&db.raw_value("daily_notes", "content", 1).await.unwrap().unwrap()));
    // empty notes stay empty
    assert_eq!(db.raw_value("tasks", "notes", id).await.unwrap().as_deref(), Some(""));

    let task = db.load_task(&*session, id).await.unwrap().unwrap();
    assert_eq!(task.title, "Written before setup");
}

#[tokio::test]
async fn test_change_password_reencrypts_everything() {
    let (db, session) = unlocked_session("old").await;
    let id = db.save_task(&*session, &Task::new("Renew passport")).await.unwrap();
    let before = db.raw_value("tasks", "title", id).await.unwrap().unwrap();

    let report = session.change_password(pw("old"), pw("new")).await.unwrap();
    assert_eq!(report.values_rewritten, 1);
    assert_eq!(session.state(), AuthState::Unlocked);

    let after = db.raw_value("tasks", "title", id).await.unwrap().unwrap();
    assert_ne!(before, after);
    assert_eq!(db.load_task(&*session, id).await.unwrap().unwrap().title, "Renew passport");

    session.lock().await;
    assert!(session.unlock(pw("old")).await.unwrap_err().is_invalid_password());
    session.unlock(pw("new")).await.unwrap();
    assert_eq!(db.load_task(&*session, id).await.unwrap().unwrap().title, "Renew passport");
}

#[tokio::test]
async fn test_change_password_from_locked() {
    let (db, session) = unlocked_session("old").await;
    let id = db.save_task(&*session, &Task::new("x")).await.unwrap();
    session.lock().await;

    session.change_password(pw("old"), pw("new")).await.unwrap();
    assert_eq!(session.state(), AuthState::Unlocked);
    assert_eq!(db.load_task(&*session, id).await.unwrap().unwrap().title, "x");
}

#[tokio::test]
async fn test_change_password_wrong_old_changes_nothing() {
    let (db, session) = unlocked_session("old").await;
    let settings_before = db.load_encryption_settings().await.unwrap();

    let err = session.change_password(pw("wrong"), pw("new")).await.unwrap_err();
    assert!(err.is_invalid_password());
    assert_eq!(db.load_encryption_settings().await.unwrap(), settings_before);
    assert_eq!(session.state(), AuthState::Unlocked);
}

#[tokio::test]
async fn test_change_password_is_atomic_on_corrupt_row() {
    let (db, session) = unlocked_session("old").await;
    let good = db.save_task(&*session, &Task::new("keep me")).await.unwrap();
    let good_raw = db.raw_value("tasks", "title", good).await.unwrap().unwrap();

    // a value sealed under some other key: decrypting it with the old key fails
    let foreign = encrypt("poison", &FieldKey32::new([9; 32])).unwrap();
    db.execute_raw(&format!(
        "INSERT INTO tasks (title, notes) VALUES ('{}', '')",
        foreign.as_str()
    ))
    .await
    .unwrap();
    let settings_before = db.load_encryption_settings().await.unwrap();

    let err = session.change_password(pw("old"), pw("new")).await.unwrap_err();
    assert!(matches!(err, CoreError::Reencryption(_)));

    // nothing moved: same ciphertext, same settings, old key still active
    assert_eq!(db.raw_value("tasks", "title", good).await.unwrap().unwrap(), good_raw);
    assert_eq!(db.load_encryption_settings().await.unwrap(), settings_before);
    assert_eq!(session.state(), AuthState::Unlocked);
    assert_eq!(db.load_task(&*session, good).await.unwrap().unwrap().title, "keep me");

    session.lock().await;
    session.unlock(pw("old")).await.unwrap();
    assert!(session.unlock(pw("new")).await.unwrap_err().is_invalid_password());
}

#[tokio::test]
async fn test_disable_restores_plaintext() {
    let (db, session) = unlocked_session("pw").await;
    let id = db.save_task(&*session, &Task::new("Back to plain")).await.unwrap();
    session.lock().await;

    let err = session.disable_encryption(pw("bad")).await.unwrap_err();
    assert!(err.is_invalid_password());
    assert_eq!(session.state(), AuthState::Locked);

    session.disable_encryption(pw("pw")).await.unwrap();
    assert_eq!(session.state(), AuthState::NotConfigured);
    assert_eq!(
        db.raw_value("tasks", "title", id).await.unwrap().as_deref(),
        Some("Back to plain")
    );
    assert!(!db.load_encryption_settings().await.unwrap().is_enabled());
    assert_eq!(db.get_setting::<String>("encryption_salt").await.unwrap(), None);
    assert_eq!(db.get_setting::<String>("encryption_key_hash").await.unwrap(), None);

    // writes are plaintext again
    let id2 = db.save_task(&*session, &Task::new("new one")).await.unwrap();
    assert_eq!(db.raw_value("tasks", "title", id2).await.unwrap().as_deref(), Some("new one"));
    assert_eq!(db.load_tasks(&*session, &TaskFilter::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_pbkdf2_vault() {
    let (db, session) = fresh_session().await;
    session.setup_with_method(pw("pw"), KdfMethod::Pbkdf2).await.unwrap();
    assert_eq!(session.kdf_method(), KdfMethod::Pbkdf2);

    let reloaded = AuthSession::load(Arc::clone(&db), KdfParams::fast()).await.unwrap();
    assert_eq!(reloaded.kdf_method(), KdfMethod::Pbkdf2);
    reloaded.unlock(pw("pw")).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_unlock_and_lock_serialize() {
    let (_db, session) = unlocked_session("pw").await;
    session.lock().await;

    let a = {
        let s = Arc::clone(&session);
        tokio::spawn(async move { s.unlock(pw("pw")).await })
    };
    let b = {
        let s = Arc::clone(&session);
        tokio::spawn(async move { s.unlock(pw("pw")).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();
    assert_eq!(session.state(), AuthState::Unlocked);
}

#[tokio::test]
async fn test_enc_prefixed_plaintext_survives_every_transition() {
    let title = "ENC: rotate encoder keys";
    let (db, session) = fresh_session().await;
    let id = db.save_task(&*session, &Task::new(title)).await.unwrap();

    // plain store: shown and saved back as typed
    let task = db.load_task(&*session, id).await.unwrap().unwrap();
    assert_eq!(task.title, title);
    db.save_task(&*session, &task).await.unwrap();

    session.setup(pw("pw")).await.unwrap();
    let raw = db.raw_value("tasks", "title", id).await.unwrap().unwrap();
    assert_ne!(raw, title);
    assert!(is_encrypted(&raw));
    assert_eq!(db.load_tasks(&*session, &TaskFilter::default()).await.unwrap()[0].title, title);

    session.change_password(pw("pw"), pw("pw2")).await.unwrap();
    assert_eq!(db.load_task(&*session, id).await.unwrap().unwrap().title, title);

    session.disable_encryption(pw("pw2")).await.unwrap();
    assert_eq!(db.raw_value("tasks", "title", id).await.unwrap().as_deref(), Some(title));
}

#[tokio::test]
async fn test_configured_kdf_method_is_used_for_setup() {
    let config = Config::from_toml_str(
        "[security]\nkdf_method = \"pbkdf2\"\n\n[features]\nskip_kdf_slowdown = true\n",
    )
    .unwrap();
    let db = common::memory_db();
    let session = AuthSession::from_config(Arc::clone(&db), &config).await.unwrap();
    session.setup(pw("pw")).await.unwrap();

    assert_eq!(session.kdf_method(), KdfMethod::Pbkdf2);
    assert_eq!(db.load_encryption_settings().await.unwrap().kdf_method(), KdfMethod::Pbkdf2);

    let reloaded = AuthSession::load(Arc::clone(&db), KdfParams::fast()).await.unwrap();
    reloaded.unlock(pw("pw")).await.unwrap();

    // argon2 stays the default
    let (_db, default) = fresh_session().await;
    default.setup(pw("pw")).await.unwrap();
    assert_eq!(default.kdf_method(), KdfMethod::Argon2id);
}

// src/bin/vault_admin.rs
//! Vault admin — inspect lock state, set up / change / remove the master password
//!
//! Usage: vault_admin <status|setup|change-password|disable|list>

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rpassword::read_password;
use task_vault::{
    load_config, AuthSession, AuthState, Database, MasterPassword, TaskFilter,
};
use tracing::{info, warn};

fn prompt_password(label: &str) -> Result<MasterPassword> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    let input = read_password()?;
    Ok(MasterPassword::new(input.trim_end().to_owned()))
}

fn prompt_new_password() -> Result<MasterPassword> {
    let first = prompt_password("New master password")?;
    let second = prompt_password("Repeat new master password")?;
    if first.expose_secret() != second.expose_secret() {
        bail!("passwords do not match");
    }
    if first.expose_secret().is_empty() {
        bail!("empty password refused");
    }
    Ok(first)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "status".to_owned());
    let config = load_config();
    let db_path = config.database_path();

    let db = Arc::new(
        Database::open(&db_path)
            .with_context(|| format!("Failed to open task database at {}", db_path.display()))?,
    );
    let session = AuthSession::from_config(Arc::clone(&db), config)
        .await
        .context("Failed to read encryption settings")?;

    info!("task-vault admin — {}", db_path.display());

    match command.as_str() {
        "status" => {
            println!("State: {}", session.state());
            println!("KDF:   {}", session.kdf_method());
        }
        "setup" => {
            if session.state() != AuthState::NotConfigured {
                bail!("encryption is already set up");
            }
            let pwd = prompt_new_password()?;
            session.setup(pwd).await?;
            println!("Encryption enabled; existing tasks, projects and notes are now sealed.");
        }
        "change-password" => {
            let old = prompt_password("Current master password")?;
            let new = prompt_new_password()?;
            let report = session.change_password(old, new).await?;
            println!("Password changed; {} value(s) re-encrypted.", report.values_rewritten);
        }
        "disable" => {
            let pwd = prompt_password("Master password")?;
            let report = session.disable_encryption(pwd).await?;
            println!("Encryption disabled; {} value(s) stored as plaintext.", report.values_rewritten);
        }
        "list" => {
            if session.state() == AuthState::Locked {
                let pwd = prompt_password("Master password")?;
                if let Err(e) = session.unlock(pwd).await {
                    warn!("unlock failed: {e}");
                    println!("Wrong password — showing locked view.");
                }
            }
            let tasks = db.load_tasks(&session, &TaskFilter::pending()).await?;
            println!("\n=== {} open task(s) ===", tasks.len());
            for task in tasks {
                let due = task
                    .due_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_owned());
                let repeat = if task.is_recurring() { " ↻" } else { "" };
                println!("{:>5}  {due:<10}  {}{repeat}", task.id.unwrap_or_default(), task.title);
            }
            session.lock().await;
        }
        other => bail!("unknown command {other:?} (expected status, setup, change-password, disable or list)"),
    }

    Ok(())
}

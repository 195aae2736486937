// src/auth/worker.rs
//! Single consumer for auth commands
//!
//! UI callbacks are synchronous and must not block on a KDF. They submit
//! an [`AuthCommand`] and, when they care about the outcome, await the
//! reply. `submit_lock` is the one fire-and-forget entry point, for events
//! like "app went to background".

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::aliases::MasterPassword;
use crate::auth::AuthSession;
use crate::db::ResealReport;
use crate::error::{CoreError, Result};

const COMMAND_QUEUE: usize = 32;

pub enum AuthCommand {
    Setup {
        password: MasterPassword,
        reply: oneshot::Sender<Result<()>>,
    },
    Unlock {
        password: MasterPassword,
        reply: oneshot::Sender<Result<()>>,
    },
    /// `reply` is `None` for fire-and-forget submissions
    Lock { reply: Option<oneshot::Sender<()>> },
    ChangePassword {
        old: MasterPassword,
        new: MasterPassword,
        reply: oneshot::Sender<Result<ResealReport>>,
    },
    Disable {
        password: MasterPassword,
        reply: oneshot::Sender<Result<ResealReport>>,
    },
}

impl AuthCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AuthCommand::Setup { .. } => "setup",
            AuthCommand::Unlock { .. } => "unlock",
            AuthCommand::Lock { .. } => "lock",
            AuthCommand::ChangePassword { .. } => "change_password",
            AuthCommand::Disable { .. } => "disable",
        }
    }
}

/// Cloneable submission side of the worker
#[derive(Clone)]
pub struct AuthHandle {
    sender: mpsc::Sender<AuthCommand>,
}

fn worker_gone() -> CoreError {
    CoreError::Worker("auth worker stopped".into())
}

impl AuthHandle {
    /// Queue a lock without waiting. Safe to call from synchronous code.
    /// Returns false when the queue is full or the worker has stopped.
    pub fn submit_lock(&self) -> bool {
        match self.sender.try_send(AuthCommand::Lock { reply: None }) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "lock request dropped");
                false
            }
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> AuthCommand,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| worker_gone())?;
        rx.await.map_err(|_| worker_gone())
    }

    pub async fn setup(&self, password: MasterPassword) -> Result<()> {
        self.request(|reply| AuthCommand::Setup { password, reply })
            .await?
    }

    pub async fn unlock(&self, password: MasterPassword) -> Result<()> {
        self.request(|reply| AuthCommand::Unlock { password, reply })
            .await?
    }

    pub async fn lock(&self) -> Result<()> {
        self.request(|reply| AuthCommand::Lock { reply: Some(reply) })
            .await
    }

    pub async fn change_password(
        &self,
        old: MasterPassword,
        new: MasterPassword,
    ) -> Result<ResealReport> {
        self.request(|reply| AuthCommand::ChangePassword { old, new, reply })
            .await?
    }

    pub async fn disable_encryption(&self, password: MasterPassword) -> Result<ResealReport> {
        self.request(|reply| AuthCommand::Disable { password, reply })
            .await?
    }
}

/// Spawn the worker on the current tokio runtime. It exits once every
/// [`AuthHandle`] has been dropped.
pub fn spawn_auth_worker(session: Arc<AuthSession>) -> (AuthHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(COMMAND_QUEUE);
    let join = tokio::spawn(worker_loop(session, receiver));
    (AuthHandle { sender }, join)
}

async fn worker_loop(session: Arc<AuthSession>, mut receiver: mpsc::Receiver<AuthCommand>) {
    info!("auth worker started");

    while let Some(command) = receiver.recv().await {
        debug!(command = command.name(), "auth command");
        match command {
            AuthCommand::Setup { password, reply } => {
                let _ = reply.send(session.setup(password).await);
            }
            AuthCommand::Unlock { password, reply } => {
                let _ = reply.send(session.unlock(password).await);
            }
            AuthCommand::Lock { reply } => {
                session.lock().await;
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
            AuthCommand::ChangePassword { old, new, reply } => {
                let _ = reply.send(session.change_password(old, new).await);
            }
            AuthCommand::Disable { password, reply } => {
                let _ = reply.send(session.disable_encryption(password).await);
            }
        }
    }

    info!("auth worker stopped");
}

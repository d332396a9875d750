//! Cloneable façade for issuing commands to the session worker.
//!
//! [`SessionHandle`] hides channel plumbing and offers async helpers for
//! querying progression and driving debug commands.
use tokio::sync::{mpsc, oneshot};

use runner_core::{EntityId, ProgressionState};

use super::errors::{Result, RuntimeError};
use crate::events::EventBus;
use crate::workers::Command;

/// Read-only view of the running playthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub progression: ProgressionState,
    pub player: Option<EntityId>,
    /// Cancellation generation of the running loops. Bumped on every reset.
    pub generation: u64,
}

/// Client-facing handle to interact with the session.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl SessionHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Query the current progression (read-only snapshot).
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| Command::QueryState { reply }).await
    }

    /// Jump to `chapter`, optionally raising the highest-chapter record.
    ///
    /// Stage and distance baseline are untouched. A chapter without encounter
    /// data is returned as [`RuntimeError::Config`] and leaves spawning off.
    pub async fn set_chapter(&self, chapter: u32, update_record: bool) -> Result<()> {
        self.request(|reply| Command::SetChapter {
            chapter,
            update_record,
            reply,
        })
        .await?
        .map_err(RuntimeError::from)
    }

    /// Stop both loops, revoke the session's subscriptions and end the worker.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

//! Session worker that owns the authoritative progression state.
//!
//! Receives commands from [`SessionHandle`](crate::api::SessionHandle) and
//! ticks from the progression loops, plus game events forwarded from the
//! event bus, and applies all of them in order on a single task.

use std::ops::ControlFlow;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use runner_core::ConfigError;

use super::orchestrator::{Collaborators, SessionOrchestrator};
use super::scope::{LoopCadence, LoopKind};
use crate::api::{Result, ServiceRegistry, SessionSnapshot};
use crate::events::EventBus;
use crate::runtime::RuntimeConfig;

/// Commands that can be sent to the session worker
pub enum Command {
    /// Progression loop tick, tagged with the scope that produced it.
    Tick { kind: LoopKind, generation: u64 },
    /// Query the current progression (read-only).
    QueryState {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Jump to a chapter.
    SetChapter {
        chapter: u32,
        update_record: bool,
        reply: oneshot::Sender<std::result::Result<(), ConfigError>>,
    },
    /// Stop loops, revoke subscriptions and exit.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Background task that runs the session orchestrator.
pub struct SessionWorker {
    config: RuntimeConfig,
    services: ServiceRegistry,
    event_bus: EventBus,
    command_rx: mpsc::Receiver<Command>,
    command_tx: mpsc::WeakSender<Command>,
}

impl SessionWorker {
    pub fn new(
        config: RuntimeConfig,
        services: ServiceRegistry,
        event_bus: EventBus,
        command_rx: mpsc::Receiver<Command>,
        command_tx: mpsc::WeakSender<Command>,
    ) -> Self {
        Self {
            config,
            services,
            event_bus,
            command_rx,
            command_tx,
        }
    }

    /// Main worker loop.
    ///
    /// Resolves collaborators first, then subscribes, then starts the first
    /// playthrough. Commands queue up until that sequence is done.
    pub async fn run(mut self) -> Result<()> {
        let collaborators =
            match Collaborators::resolve(&self.services, self.config.service_timeout).await {
                Ok(collaborators) => collaborators,
                Err(err) => {
                    error!(target: "runtime::session", error = %err, "session failed to start");
                    return Err(err);
                }
            };

        let cadence = LoopCadence {
            distance: self.config.distance_tick,
            population: self.config.population_tick,
        };
        let mut session = SessionOrchestrator::new(
            collaborators,
            self.event_bus.clone(),
            cadence,
            self.command_tx.clone(),
            self.config.seed,
        );

        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        session.subscribe(&inbound_tx);
        drop(inbound_tx);
        session.start_or_reset();

        loop {
            tokio::select! {
                // Game events first, so a command sent after a publish sees
                // that event applied.
                biased;
                Some(inbound) = inbound_rx.recv() => {
                    session.on_inbound(inbound, &mut inbound_rx).await;
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        if Self::handle_command(&mut session, command).is_break() {
                            return Ok(());
                        }
                    }
                    None => break,
                },
            }
        }

        session.shutdown();
        Ok(())
    }

    fn handle_command(session: &mut SessionOrchestrator, cmd: Command) -> ControlFlow<()> {
        match cmd {
            Command::Tick { kind, generation } => session.on_tick(kind, generation),
            Command::QueryState { reply } => {
                if reply.send(session.snapshot()).is_err() {
                    debug!("QueryState reply channel closed (caller dropped)");
                }
            }
            Command::SetChapter {
                chapter,
                update_record,
                reply,
            } => {
                let result = session.set_chapter(chapter, update_record);
                if reply.send(result).is_err() {
                    debug!("SetChapter reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown { reply } => {
                session.shutdown();
                if reply.send(()).is_err() {
                    debug!("Shutdown reply channel closed (caller dropped)");
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

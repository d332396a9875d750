//! Cancellation scope for the two progression loops.
//!
//! Each playthrough owns exactly one [`LoopScope`]. The loops never touch
//! session state themselves: every tick is sent back to the session worker
//! tagged with the scope's generation, and the worker drops ticks whose
//! generation is no longer current.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

use super::session::Command;

/// Which loop produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// Stage-distance loop.
    Distance,
    /// Encounter-population loop.
    Population,
}

/// Tick periods for both loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoopCadence {
    pub distance: Duration,
    pub population: Duration,
}

pub(crate) struct LoopScope {
    generation: u64,
    cancel: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl LoopScope {
    /// Scope with no loops, used before the first playthrough.
    pub fn idle() -> Self {
        let (cancel, _) = watch::channel(true);
        Self {
            generation: 0,
            cancel,
            tasks: Vec::new(),
        }
    }

    /// Spawns both loops under a new scope.
    pub fn start(
        generation: u64,
        cadence: LoopCadence,
        commands: mpsc::WeakSender<Command>,
    ) -> Self {
        let (cancel, cancelled) = watch::channel(false);
        let tasks = vec![
            tokio::spawn(run_loop(
                LoopKind::Distance,
                cadence.distance,
                generation,
                cancelled.clone(),
                commands.clone(),
            )),
            tokio::spawn(run_loop(
                LoopKind::Population,
                cadence.population,
                generation,
                cancelled,
                commands,
            )),
        ];
        trace!(target: "runtime::loops", generation, "loops started");

        Self {
            generation,
            cancel,
            tasks,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signals both loops to stop at their next tick boundary.
    pub fn cancel(&mut self) {
        if !self.cancel.send_replace(true) {
            trace!(target: "runtime::loops", generation = self.generation, "loops cancelled");
        }
    }

    /// Cancels and stops both loop tasks without waiting for a tick boundary.
    pub fn abort(&mut self) {
        self.cancel();
        for task in &self.tasks {
            task.abort();
        }
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Loop tasks that have not finished yet.
    #[cfg(test)]
    pub fn running(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }
}

impl Drop for LoopScope {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

async fn run_loop(
    kind: LoopKind,
    period: Duration,
    generation: u64,
    mut cancelled: watch::Receiver<bool>,
    commands: mpsc::WeakSender<Command>,
) {
    // The first tick completes immediately: a fresh playthrough reports its
    // distance and gets its first wave without waiting a full period.
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancelled.wait_for(|cancelled| *cancelled) => break,
            _ = interval.tick() => {}
        }

        if *cancelled.borrow() {
            break;
        }
        let Some(commands) = commands.upgrade() else {
            break;
        };
        if commands
            .send(Command::Tick { kind, generation })
            .await
            .is_err()
        {
            break;
        }
    }

    trace!(target: "runtime::loops", ?kind, generation, "loop terminated");
}

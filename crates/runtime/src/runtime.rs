//! High-level runtime orchestrator.
//!
//! The runtime owns the session worker, wires up the command channel, and
//! exposes a builder-based API for clients to start a session.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{Result, RuntimeError, ServiceRegistry, SessionHandle};
use crate::events::EventBus;
use crate::workers::{Command, SessionWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Stage-distance loop period.
    pub distance_tick: Duration,
    /// Encounter-population loop period.
    pub population_tick: Duration,
    pub command_buffer_size: usize,
    /// Give up resolving services after this long. `None` waits forever.
    pub service_timeout: Option<Duration>,
    /// Seed for encounter counts. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl RuntimeConfig {
    pub const DEFAULT_DISTANCE_TICK: Duration = Duration::from_millis(100);
    pub const DEFAULT_POPULATION_TICK: Duration = Duration::from_millis(1000);
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            distance_tick: Self::DEFAULT_DISTANCE_TICK,
            population_tick: Self::DEFAULT_POPULATION_TICK,
            command_buffer_size: 32,
            service_timeout: None,
            seed: None,
        }
    }
}

/// Main runtime that hosts one progression session.
///
/// Design: Runtime owns the worker task.
/// [`SessionHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: SessionHandle,
    services: ServiceRegistry,
    worker: JoinHandle<Result<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Registry the session resolves its collaborators from.
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn event_bus(&self) -> &EventBus {
        self.handle.event_bus()
    }

    /// Shutdown the runtime gracefully
    ///
    /// Returns the worker's own error if it never started, for example when
    /// a service could not be resolved in time.
    pub async fn shutdown(self) -> Result<()> {
        if let Err(err) = self.handle.shutdown().await {
            tracing::debug!(target: "runtime::session", error = %err, "worker already stopped");
        }
        drop(self.handle);

        self.worker.await.map_err(RuntimeError::WorkerJoin)?
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    services: Option<ServiceRegistry>,
    event_bus: Option<EventBus>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            services: None,
            event_bus: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Registry to resolve collaborators from. Services may be registered
    /// after `build`; the session waits for them.
    pub fn services(mut self, services: ServiceRegistry) -> Self {
        self.services = Some(services);
        self
    }

    /// Share an existing bus instead of creating one.
    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Build the runtime and spawn the session worker.
    pub async fn build(self) -> Runtime {
        let services = self.services.unwrap_or_default();
        let event_bus = self.event_bus.unwrap_or_default();

        let (command_tx, command_rx) =
            mpsc::channel::<Command>(self.config.command_buffer_size.max(1));
        let worker = SessionWorker::new(
            self.config,
            services.clone(),
            event_bus.clone(),
            command_rx,
            command_tx.downgrade(),
        );
        let worker = tokio::spawn(worker.run());

        Runtime {
            handle: SessionHandle::new(command_tx, event_bus),
            services,
            worker,
        }
    }
}

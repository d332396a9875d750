//! Runtime orchestration for the runner progression session.
//!
//! This crate wires together the event bus, the service registry, the
//! collaborator traits and the session worker into a cohesive runtime API.
//! Consumers register collaborators, build a [`Runtime`], and interact with
//! the session through [`SessionHandle`] and the [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the typed, scoped event bus and event payloads
//! - `workers` keeps background tasks internal to the crate
//! - [`oracle`] and [`memory`] provide adapters reused by other crates
pub mod api;
pub mod events;
pub mod memory;
pub mod oracle;
pub mod runtime;

mod workers;

pub use api::{
    AccountContext, ConfigError, EncounterManager, PlayerWorld, RebirthStatSystem, Result,
    RuntimeError, ServiceRegistry, SessionHandle, SessionSnapshot, StatUpgradeSystem,
};
pub use events::{Event, EventBus, Scope, Subscription, SubscriptionSet};
pub use memory::{FlatRebirthStats, FlatStatSystem, InMemoryAccount, LinearStat};
pub use oracle::StageOracleImpl;
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::LoopKind;

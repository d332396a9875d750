//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration and workers.

pub mod collaborators;
pub mod errors;
pub mod handle;
pub mod registry;

pub use collaborators::{
    AccountContext, EncounterManager, PlayerWorld, RebirthStatSystem, StatUpgradeSystem,
};
pub use errors::{ConfigError, Result, RuntimeError};
pub use handle::{SessionHandle, SessionSnapshot};
pub use registry::ServiceRegistry;

//! Progression rules and data types shared across the runner crates.
//!
//! `runner-core` defines the chapter/stage state machine, the economy math and
//! the numeric types they run on. Everything here is synchronous and free of
//! I/O so the runtime, content loaders and tests can all reuse it directly.
pub mod config;
pub mod economy;
pub mod env;
pub mod error;
pub mod formula;
pub mod number;
pub mod state;
pub mod stats;

pub use config::{EncounterSetConfig, PlayerInitStats, SessionConfig};
pub use economy::{Economy, KillReward};
pub use env::{StageOracle, resolve_encounters};
pub use error::ConfigError;
pub use formula::{Formula, FormulaError};
pub use number::{BigNumber, NumberParseError};
pub use state::{Crossing, DistanceTick, EntityId, Position, ProgressionState};
pub use stats::{RebirthStatId, StatKind, StatUpdate, StatUpgradeId};

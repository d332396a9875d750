//! Traits describing read-only authored data.
//!
//! The progression state machine never owns chapter tables directly. It reads
//! them through oracles so the runtime can back them with whatever storage the
//! content layer produced.
mod stages;

pub use stages::{StageOracle, resolve_encounters};

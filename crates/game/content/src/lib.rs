//! Data-driven content definitions and loaders.
//!
//! This crate provides loaders for the authored RON/TOML data files:
//! - Session configuration (data-driven via TOML)
//! - Chapter stage tables (data-driven via RON)
//!
//! Content is consumed by runtime oracles and never appears in progression state.
//!
//! All loaders use runner-core types directly with serde for RON/TOML deserialization.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ContentFactory, LoadResult, SessionLoader, StageLoader, StageTable};

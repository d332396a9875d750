//! Runtime wrappers around static content oracles.
//!
//! These implementations expose `runner-core` oracle traits over data loaded
//! by `runner-content`. The data is immutable at runtime; dynamic state lives
//! in the session worker.
mod stages;

pub use stages::StageOracleImpl;

//! In-memory collaborator implementations for testing and local runs.

mod account;
mod stats;

pub use account::InMemoryAccount;
pub use stats::{FlatRebirthStats, FlatStatSystem, LinearStat};

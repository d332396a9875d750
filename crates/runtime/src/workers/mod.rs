//! Worker tasks that back the runtime orchestration.
//!
//! The session worker owns progression state; the loop tasks in [`scope`]
//! only feed it ticks.

mod orchestrator;
mod scope;
mod session;

pub use scope::LoopKind;
pub use session::{Command, SessionWorker};

//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and service resolution so clients
//! can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

pub use runner_core::ConfigError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("timed out resolving services: {}", missing.join(", "))]
    ServiceTimeout { missing: Vec<&'static str> },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

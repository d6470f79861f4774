use std::io;

use thiserror::Error;

/// Faults reported by [`AffineExecutor`](crate::AffineExecutor) operations.
///
/// Every variant is returned synchronously from the call that triggered it.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The task conduit was closed before the task could run.
    #[error("executor stopped")]
    Stopped,

    /// `stop` was called on an executor that is already stopped.
    #[error("executor already stopped")]
    AlreadyStopped,

    /// `run` was called on an executor that is already bound to a thread,
    /// whether or not that first run-loop has since returned.
    #[error("executor already bound to a thread")]
    AlreadyRunning,

    /// The task body panicked on the bound thread.
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// A dedicated bound thread could not be spawned.
    #[error("failed to spawn bound thread: {0}")]
    Spawn(#[from] io::Error),
}

impl ExecutorError {
    /// Whether this error means the executor no longer accepts work.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped | Self::AlreadyStopped)
    }
}

/// Result alias for executor operations.
pub type Result<T, E = ExecutorError> = std::result::Result<T, E>;

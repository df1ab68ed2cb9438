//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while launching an external process.
///
/// A process that starts and exits non-zero is not an error at this layer; the
/// exit code is reported in [`crate::ExecutionResult`] and interpreted by callers.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Program not found on PATH: {0}")]
    ProgramNotFound(String),

    #[error("Failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for IaC module.

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur during IaC operations.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Terraform not available: {0}")]
    TerraformNotAvailable(String),

    /// The tool exited non-zero; `diagnostic` is its stderr, or stdout when
    /// stderr was empty.
    #[error("`{command}` failed: {diagnostic}")]
    CommandFailed { command: String, diagnostic: String },

    #[error("Core error: {0}")]
    Core(#[from] vault_core::CoreError),

    #[error("Runner error: {0}")]
    Runner(#[from] vault_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

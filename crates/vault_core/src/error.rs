//! Error types for the core module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
///
/// Corrupt or missing state and metadata files are never reported through this
/// type; readers treat them as absent.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Lab not found: {0}")]
    LabNotFound(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Configuration file not found: {}", .0.display())]
    MissingConfig(PathBuf),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Runner error: {0}")]
    Runner(#[from] vault_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

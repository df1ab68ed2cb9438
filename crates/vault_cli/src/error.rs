//! Operator-facing failures raised by command handlers.

use thiserror::Error;

use crate::ExitCodes;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Lab {0} is not deployed")]
    NotDeployed(String),

    #[error("{provider} CLI `{binary}` is not installed or not on PATH")]
    MissingPrerequisite { provider: String, binary: String },

    #[error("Deployment of {lab} failed: {message}")]
    DeploymentFailed { lab: String, message: String },

    #[error("Destroy of {0} failed; resources may remain, re-run destroy")]
    DestroyFailed(String),

    #[error("Terraform validation failed for {0}")]
    ValidationFailed(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::InvalidArgument(_) | CliError::NotDeployed(_) => ExitCodes::INVALID_ARGS,
            CliError::MissingPrerequisite { .. } => ExitCodes::GENERAL_ERROR,
            CliError::DeploymentFailed { .. }
            | CliError::DestroyFailed(_)
            | CliError::ValidationFailed(_) => ExitCodes::IAC_ERROR,
        }
    }
}

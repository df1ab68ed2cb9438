//! # vault_iac
//!
//! Terraform execution for VAULT labs.
//!
//! [`TerraformRunner`] wraps `init`, `plan`, `apply`, `destroy`, `output`,
//! `state list` and `validate` behind typed results. It talks to Terraform only
//! through the [`vault_runner::CommandRunner`] port and reads state through
//! [`vault_core::StateManager`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vault_core::{CloudProvider, Lab, StateManager};
//! use vault_iac::TerraformRunner;
//! use vault_runner::{ProcessRunner, ProcessRunnerOptions};
//!
//! let runner = Arc::new(ProcessRunner::new(ProcessRunnerOptions::default()));
//! let state = StateManager::new(".state").unwrap();
//! let terraform = TerraformRunner::new(runner, state, "terraform").unwrap();
//!
//! let lab = Lab::new("iam-privesc", "labs/aws/iam-privesc", CloudProvider::Aws);
//! let plan = terraform.plan(&lab, &[], false).unwrap();
//! println!("{}", plan);
//! ```

pub mod error;
pub mod output;
pub mod terraform;

pub use error::{IacError, IacResult};
pub use output::{output_values, DeploymentResult, TerraformOutput, REDACTED};
pub use terraform::{key_resources, TerraformRunner};

//! # vault_runner
//!
//! External process execution port for VAULT.
//!
//! Every call to an external binary (the IaC tool, provider CLIs) goes through the
//! [`CommandRunner`] trait so the orchestration logic above it can be exercised
//! against a [`MockRunner`] instead of real tooling.
//!
//! # Features
//!
//! - **Process Runner**: Blocking `std::process` execution with captured output
//! - **Streaming**: Optional line-by-line echo of child output while capturing it
//! - **Mock Runner**: Scripted responses and captured calls for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use vault_runner::{CommandRunner, CommandSpec, ProcessRunner, ProcessRunnerOptions};
//!
//! let runner = ProcessRunner::new(ProcessRunnerOptions::default());
//! let spec = CommandSpec::new("terraform").arg("version");
//! let result = runner.run(&spec).unwrap();
//! println!("Exit code: {}", result.exit_code);
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod process;
pub mod runner;

pub use config::CommandSpec;
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use process::{ProcessRunner, ProcessRunnerOptions};
pub use runner::{CommandRunner, ExecutionResult};

//! Command runner trait and types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CommandSpec;
use crate::error::RunnerResult;

/// Result of a finished external process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code (-1 when the process was terminated by a signal)
    pub exit_code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Text best describing a failure: stderr when present, stdout otherwise.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Port for running external programs.
///
/// Calls block until the child exits. Implementations must not retry.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion.
    fn run(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult>;

    /// Check whether `program` launches and exits zero with the given probe arguments.
    fn probe(&self, program: &str, args: &[&str]) -> bool {
        let spec = CommandSpec::new(program).args(args.iter().copied());
        self.run(&spec).map(|r| r.success()).unwrap_or(false)
    }
}

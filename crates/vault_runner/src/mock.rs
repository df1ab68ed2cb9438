//! Mock command runner for testing.
//!
//! Provides a scriptable implementation of the [`CommandRunner`] trait so that
//! orchestration logic can be tested without the real IaC tool or cloud CLIs.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::config::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult};

/// Predefined mock response for a command execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
        }
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub stream: bool,
    pub interactive: bool,
}

impl CapturedCall {
    /// First argument, usually the subcommand.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct Rule {
    program: String,
    prefix: Vec<String>,
    response: MockResponse,
}

/// Mock command runner for testing.
///
/// Responses are matched against the program and a prefix of its arguments.
/// The most recently added matching rule wins; unmatched calls succeed with
/// empty output.
#[derive(Clone, Default)]
pub struct MockRunner {
    rules: Arc<RwLock<Vec<Rule>>>,
    missing_programs: Arc<RwLock<Vec<String>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `program` invocations whose args start with `prefix`.
    pub fn respond_to(self, program: &str, prefix: &[&str], response: MockResponse) -> Self {
        self.rules.write().push(Rule {
            program: program.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response,
        });
        self
    }

    /// Make `program` behave as if it is not installed.
    pub fn missing_program(self, program: impl Into<String>) -> Self {
        self.missing_programs.write().push(program.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Subcommands in call order, e.g. `["version", "init", "plan"]`.
    pub fn subcommands(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .filter_map(|c| c.subcommand().map(str::to_string))
            .collect()
    }

    /// Get calls whose first argument is `subcommand`.
    pub fn calls_for(&self, subcommand: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.subcommand() == Some(subcommand))
            .cloned()
            .collect()
    }

    fn response_for(&self, spec: &CommandSpec) -> MockResponse {
        self.rules
            .read()
            .iter()
            .rev()
            .find(|rule| {
                rule.program == spec.program
                    && rule.prefix.len() <= spec.args.len()
                    && rule.prefix.iter().zip(&spec.args).all(|(a, b)| a == b)
            })
            .map(|rule| rule.response.clone())
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        self.captured_calls.write().push(CapturedCall {
            program: spec.program.clone(),
            args: spec.args.clone(),
            working_dir: spec.working_dir.clone(),
            stream: spec.stream,
            interactive: spec.interactive,
        });

        if self.missing_programs.read().contains(&spec.program) {
            return Err(RunnerError::ProgramNotFound(spec.program.clone()));
        }

        let response = self.response_for(spec);
        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(ExecutionResult {
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}

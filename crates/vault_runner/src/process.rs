//! Blocking process runner backed by `std::process`.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult};

/// Process runner options.
#[derive(Debug, Clone)]
pub struct ProcessRunnerOptions {
    /// CI mode (prefix streamed lines with timestamps)
    pub ci_mode: bool,
}

impl Default for ProcessRunnerOptions {
    fn default() -> Self {
        Self {
            ci_mode: std::env::var("CI").is_ok(),
        }
    }
}

impl ProcessRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ci_mode(mut self) -> Self {
        self.ci_mode = true;
        self
    }
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    options: ProcessRunnerOptions,
}

impl ProcessRunner {
    pub fn new(options: ProcessRunnerOptions) -> Self {
        Self { options }
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }
        cmd.envs(&spec.env);
        cmd
    }

    fn spawn_error(spec: &CommandSpec, e: io::Error) -> RunnerError {
        if e.kind() == io::ErrorKind::NotFound {
            RunnerError::ProgramNotFound(spec.program.clone())
        } else {
            RunnerError::SpawnFailed {
                program: spec.program.clone(),
                message: e.to_string(),
            }
        }
    }

    /// Execute and capture output, echoing each line as it arrives.
    fn execute_with_streaming(&self, spec: &CommandSpec) -> RunnerResult<(i32, String, String)> {
        let mut cmd = Self::command(spec);
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| Self::spawn_error(spec, e))?;

        let stdout = child.stdout.take().ok_or_else(|| RunnerError::SpawnFailed {
            program: spec.program.clone(),
            message: "stdout pipe unavailable".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| RunnerError::SpawnFailed {
            program: spec.program.clone(),
            message: "stderr pipe unavailable".to_string(),
        })?;

        let ci_mode = self.options.ci_mode;
        let stdout_handle = thread::spawn(move || echo_lines(stdout, ci_mode, false));
        let stderr_handle = thread::spawn(move || echo_lines(stderr, ci_mode, true));

        let status = child.wait()?;
        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();

        Ok((status.code().unwrap_or(-1), stdout, stderr))
    }

    /// Execute attached to the terminal. Output goes straight to the operator.
    fn execute_interactive(&self, spec: &CommandSpec) -> RunnerResult<(i32, String, String)> {
        let status = Self::command(spec)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Self::spawn_error(spec, e))?;

        Ok((status.code().unwrap_or(-1), String::new(), String::new()))
    }

    fn execute_captured(&self, spec: &CommandSpec) -> RunnerResult<(i32, String, String)> {
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::spawn_error(spec, e))?;

        Ok((
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

fn echo_lines<R: Read>(source: R, ci_mode: bool, is_stderr: bool) -> String {
    let reader = BufReader::new(source);
    let mut output = String::new();
    for line in reader.lines().map_while(Result::ok) {
        output.push_str(&line);
        output.push('\n');
        let rendered = if ci_mode {
            format!(
                "[{}] [{}] {}",
                Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                if is_stderr { "stderr" } else { "stdout" },
                line
            )
        } else {
            line
        };
        if is_stderr {
            eprintln!("{}", rendered);
        } else {
            println!("{}", rendered);
        }
    }
    output
}

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        debug!("Executing: {}", spec.display());

        let started_at = Utc::now();
        let start = Instant::now();

        let (exit_code, stdout, stderr) = if spec.interactive {
            self.execute_interactive(spec)?
        } else if spec.stream {
            self.execute_with_streaming(spec)?
        } else {
            self.execute_captured(spec)?
        };

        let finished_at = Utc::now();
        if exit_code != 0 {
            warn!("{} exited with code {}", spec.program, exit_code);
        }

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

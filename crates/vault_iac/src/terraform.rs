//! Terraform runner for lab projects.
//!
//! Every operation runs inside the lab directory with the backend pointed at
//! the lab's own state file under `.state/`, so `init` is repeated before each
//! operation: the backend must always match the lab being worked on.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use vault_core::state::TFSTATE_FILE;
use vault_core::{Lab, StateManager};
use vault_runner::{CommandRunner, CommandSpec, ExecutionResult, RunnerError};

use crate::error::{IacError, IacResult};
use crate::output::{parse_outputs, DeploymentResult, TerraformOutput};

/// Local plugin/module cache Terraform keeps inside the lab directory.
pub const LOCAL_CACHE_DIR: &str = ".terraform";

/// Resource address fragments worth highlighting in status output.
const KEY_RESOURCE_MARKERS: &[&str] = &[
    "instance",
    "bucket",
    "role",
    "user",
    "storage",
    "vault",
    "application",
    "principal",
];

/// Terraform runner bound to one state directory.
pub struct TerraformRunner {
    runner: Arc<dyn CommandRunner>,
    state: StateManager,
    binary: String,
    stream: bool,
}

impl TerraformRunner {
    /// Create a runner, failing fast if `binary version` does not run.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        state: StateManager,
        binary: impl Into<String>,
    ) -> IacResult<Self> {
        let binary = binary.into();
        let version = runner
            .run(&CommandSpec::new(&binary).arg("version"))
            .map_err(|e| IacError::TerraformNotAvailable(e.to_string()))?;
        if !version.success() {
            return Err(IacError::TerraformNotAvailable(format!(
                "`{} version` exited with {}: {}",
                binary,
                version.exit_code,
                version.diagnostic()
            )));
        }
        debug!(
            "Using {}",
            version.stdout.lines().next().unwrap_or(binary.as_str())
        );

        Ok(Self {
            runner,
            state,
            binary,
            stream: false,
        })
    }

    /// Echo apply/destroy output while it runs.
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.stream = enabled;
        self
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Re-initialize the lab against its own state file.
    ///
    /// The local `.terraform` cache is removed first so a backend configured
    /// for another lab is never reused.
    pub fn init(&self, lab: &Lab) -> IacResult<()> {
        let cache = lab.terraform_dir().join(LOCAL_CACHE_DIR);
        if cache.exists() {
            debug!("Removing {:?}", cache);
            fs::remove_dir_all(&cache)?;
        }

        let backend = self.backend_path(lab)?;
        info!("Running terraform init for {}", lab);
        self.run_checked(
            lab,
            vec![
                "init".to_string(),
                "-input=false".to_string(),
                format!("-backend-config=path={}", backend.display()),
                "-reconfigure".to_string(),
            ],
            Io::Captured,
        )?;
        Ok(())
    }

    /// Plan the lab and return the human-readable plan text.
    pub fn plan(&self, lab: &Lab, var_files: &[PathBuf], destroy: bool) -> IacResult<String> {
        self.init(lab)?;

        let mut args = vec![
            "plan".to_string(),
            "-no-color".to_string(),
            "-compact-warnings".to_string(),
            "-input=false".to_string(),
        ];
        if destroy {
            args.push("-destroy".to_string());
        }
        args.extend(var_file_args(var_files));

        info!("Running terraform plan for {}", lab);
        let result = self.run_checked(lab, args, Io::Captured)?;
        Ok(result.stdout)
    }

    /// Apply the lab.
    ///
    /// A failing apply is reported through [`DeploymentResult`]; a failing
    /// init is returned as an error. Without `auto_approve` terraform owns the
    /// terminal so it can ask for approval itself.
    pub fn apply(
        &self,
        lab: &Lab,
        var_files: &[PathBuf],
        auto_approve: bool,
    ) -> IacResult<DeploymentResult> {
        self.init(lab)?;

        let mut args = vec![
            "apply".to_string(),
            "-no-color".to_string(),
            "-compact-warnings".to_string(),
        ];
        args.extend(var_file_args(var_files));
        if auto_approve {
            args.push("-auto-approve".to_string());
        }

        info!("Running terraform apply for {}", lab);
        match self.run_checked(lab, args, self.approval_io(auto_approve)) {
            Ok(_) => {
                let outputs = self.outputs(lab);
                let resources = self.state.resource_count(lab);
                info!("Applied {} ({} resources)", lab, resources);
                Ok(DeploymentResult::succeeded(
                    lab.relative_path(),
                    outputs,
                    resources,
                ))
            }
            Err(IacError::CommandFailed { diagnostic, .. }) => {
                warn!("Apply failed for {}", lab);
                Ok(DeploymentResult::failed(lab.relative_path(), diagnostic))
            }
            Err(e) => Err(e),
        }
    }

    /// Destroy the lab's resources. Returns whether terraform succeeded.
    pub fn destroy(&self, lab: &Lab, var_files: &[PathBuf], auto_approve: bool) -> IacResult<bool> {
        self.init(lab)?;

        let mut args = vec![
            "destroy".to_string(),
            "-no-color".to_string(),
            "-compact-warnings".to_string(),
        ];
        args.extend(var_file_args(var_files));
        if auto_approve {
            args.push("-auto-approve".to_string());
        }

        info!("Running terraform destroy for {}", lab);
        match self.run_checked(lab, args, self.approval_io(auto_approve)) {
            Ok(_) => Ok(true),
            Err(IacError::CommandFailed { diagnostic, .. }) => {
                warn!("Destroy failed for {}: {}", lab, diagnostic);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Lab outputs, read from the state file when it has any.
    ///
    /// Falls back to `terraform output -json`. Any failure yields an empty map.
    pub fn outputs(&self, lab: &Lab) -> BTreeMap<String, TerraformOutput> {
        if let Some(state) = self.state.load_state(lab) {
            if !state.outputs.is_empty() {
                return parse_outputs(state.outputs);
            }
        }

        match self.outputs_from_tool(lab) {
            Ok(outputs) => outputs,
            Err(e) => {
                debug!("No outputs for {}: {}", lab, e);
                BTreeMap::new()
            }
        }
    }

    /// Addresses of every resource in state.
    pub fn state_list(&self, lab: &Lab) -> IacResult<Vec<String>> {
        let result = self.run_checked(
            lab,
            vec!["state".to_string(), "list".to_string()],
            Io::Captured,
        )?;
        Ok(result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Run `terraform validate`; returns success and the tool's output.
    pub fn validate(&self, lab: &Lab) -> IacResult<(bool, String)> {
        self.init(lab)?;
        info!("Running terraform validate for {}", lab);
        let result = self.run(lab, vec!["validate".to_string(), "-no-color".to_string()], Io::Captured)?;
        Ok((result.success(), result.combined_output().trim().to_string()))
    }

    fn outputs_from_tool(&self, lab: &Lab) -> IacResult<BTreeMap<String, TerraformOutput>> {
        if !lab.terraform_dir().join(LOCAL_CACHE_DIR).exists() {
            self.init(lab)?;
        }
        let result = self.run_checked(
            lab,
            vec!["output".to_string(), "-json".to_string()],
            Io::Captured,
        )?;
        if result.stdout.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&result.stdout)?;
        Ok(parse_outputs(raw))
    }

    fn backend_path(&self, lab: &Lab) -> IacResult<PathBuf> {
        let dir = self.state.state_path(lab);
        fs::create_dir_all(&dir)?;
        Ok(dir.canonicalize()?.join(TFSTATE_FILE))
    }

    /// Without auto-approval terraform prompts, so it needs the terminal.
    fn approval_io(&self, auto_approve: bool) -> Io {
        if !auto_approve {
            Io::Interactive
        } else if self.stream {
            Io::Streamed
        } else {
            Io::Captured
        }
    }

    fn command(&self, dir: &Path, args: Vec<String>, io: Io) -> CommandSpec {
        CommandSpec::new(&self.binary)
            .args(args)
            .working_dir(dir)
            .env("TF_IN_AUTOMATION", "1")
            .stream(io == Io::Streamed)
            .interactive(io == Io::Interactive)
    }

    fn run(&self, lab: &Lab, args: Vec<String>, io: Io) -> IacResult<ExecutionResult> {
        let spec = self.command(lab.terraform_dir(), args, io);
        debug!("Executing {}", spec.display());
        self.runner.run(&spec).map_err(|e| match e {
            RunnerError::ProgramNotFound(program) => IacError::TerraformNotAvailable(program),
            other => IacError::Runner(other),
        })
    }

    /// Run and turn a non-zero exit into [`IacError::CommandFailed`].
    fn run_checked(&self, lab: &Lab, args: Vec<String>, io: Io) -> IacResult<ExecutionResult> {
        let command = format!("{} {}", self.binary, args.first().map(String::as_str).unwrap_or(""));
        let result = self.run(lab, args, io)?;
        if result.success() {
            return Ok(result);
        }

        // Interactive runs capture nothing
        let mut diagnostic = result.diagnostic();
        if diagnostic.is_empty() {
            diagnostic = format!("exited with code {}", result.exit_code);
        }
        Err(IacError::CommandFailed {
            command,
            diagnostic,
        })
    }
}

/// How a terraform child is attached to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Io {
    Captured,
    Streamed,
    Interactive,
}

fn var_file_args(var_files: &[PathBuf]) -> impl Iterator<Item = String> + '_ {
    var_files
        .iter()
        .map(|file| format!("-var-file={}", file.display()))
}

/// Resources worth highlighting, or all of them when none match.
pub fn key_resources(resources: &[String]) -> Vec<String> {
    let highlighted: Vec<String> = resources
        .iter()
        .filter(|address| {
            let lower = address.to_lowercase();
            KEY_RESOURCE_MARKERS.iter().any(|marker| lower.contains(marker))
        })
        .cloned()
        .collect();

    if highlighted.is_empty() {
        resources.to_vec()
    } else {
        highlighted
    }
}

//! Shared state for command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use vault_core::{
    ChainRegistry, CoreError, Lab, LabDiscovery, ProjectLayout, Provider, ProviderFactory,
    StateManager, VaultSettings,
};
use vault_iac::TerraformRunner;
use vault_runner::{CommandRunner, ProcessRunner, ProcessRunnerOptions};

use crate::error::CliError;

/// Everything a command needs to act on the project.
pub struct VaultContext {
    pub layout: ProjectLayout,
    pub settings: VaultSettings,
    pub discovery: LabDiscovery,
    pub state: StateManager,
    pub providers: ProviderFactory,
    pub chains: ChainRegistry,
    runner: Arc<dyn CommandRunner>,
}

impl VaultContext {
    /// Open the project at `root`, running external tools as real processes.
    pub fn open(root: &Path) -> Result<Self> {
        Self::with_runner(root, Arc::new(ProcessRunner::new(ProcessRunnerOptions::default())))
    }

    pub fn with_runner(root: &Path, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        layout
            .ensure_dirs()
            .with_context(|| format!("Failed to create project directories under {:?}", root))?;
        let settings = layout
            .load_settings()
            .with_context(|| format!("Failed to load {:?}", layout.settings_path()))?;
        let state = StateManager::new(layout.state_dir())?;
        debug!("Opened project at {:?}", root);

        Ok(Self {
            discovery: LabDiscovery::new(layout.labs_dir()),
            providers: ProviderFactory::new(layout.config_dir(), runner.clone()),
            chains: ChainRegistry::builtin(),
            layout,
            settings,
            state,
            runner,
        })
    }

    /// Resolve a 1-based index, `<provider>/<name>` path, or bare lab name.
    pub fn resolve_lab(&mut self, identifier: &str) -> Result<Lab> {
        let identifier = identifier.trim();
        let found = match identifier.parse::<usize>() {
            Ok(index) if index >= 1 => self.discovery.get_by_index(index - 1),
            Ok(_) => None,
            Err(_) => self.discovery.get_by_path(identifier),
        };
        found
            .cloned()
            .ok_or_else(|| CoreError::LabNotFound(identifier.to_string()).into())
    }

    pub fn provider(&self, lab: &Lab) -> Result<Box<dyn Provider>> {
        Ok(self.providers.for_lab(lab)?)
    }

    /// Fail when the provider's CLI is not installed.
    pub fn require_prerequisites(&self, provider: &dyn Provider) -> Result<()> {
        if provider.check_prerequisites() {
            return Ok(());
        }
        Err(CliError::MissingPrerequisite {
            provider: provider.kind().to_string(),
            binary: provider.cli_binary().to_string(),
        }
        .into())
    }

    /// Variable files for `lab`; an empty set is a configuration error.
    pub fn var_files(&self, lab: &Lab, provider: &dyn Provider) -> Result<Vec<PathBuf>> {
        let files = provider.var_files(lab);
        if files.is_empty() {
            return Err(CoreError::MissingConfig(provider.config_path())).with_context(|| {
                format!(
                    "No variable files for {}: create {:?} or {:?}",
                    lab,
                    provider.config_path(),
                    lab.terraform_dir().join(vault_core::provider::LAB_VAR_FILE)
                )
            });
        }
        Ok(files)
    }

    /// Terraform runner; fails when the configured binary does not run.
    pub fn terraform(&self) -> Result<TerraformRunner> {
        let runner = TerraformRunner::new(
            self.runner.clone(),
            self.state.clone(),
            self.settings.terraform_binary.clone(),
        )?;
        Ok(runner.with_streaming(self.settings.stream_output))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use vault_runner::MockRunner;

    pub(crate) fn project(labs: &[&str]) -> (TempDir, MockRunner, VaultContext) {
        let temp = tempdir().unwrap();
        for lab in labs {
            let dir = temp.path().join("labs").join(lab);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("main.tf"), "terraform {}\n").unwrap();
        }
        let mock = MockRunner::new();
        let ctx = VaultContext::with_runner(temp.path(), Arc::new(mock.clone())).unwrap();
        (temp, mock, ctx)
    }

    #[test]
    fn test_resolve_by_index_path_and_name() {
        let (_temp, _mock, mut ctx) = project(&["gcp/bucket-leak", "aws/iam-privesc"]);

        assert_eq!(ctx.resolve_lab("1").unwrap().relative_path(), "aws/iam-privesc");
        assert_eq!(ctx.resolve_lab("2").unwrap().relative_path(), "gcp/bucket-leak");
        assert_eq!(ctx.resolve_lab("gcp/bucket-leak").unwrap().name, "bucket-leak");
        assert_eq!(ctx.resolve_lab("iam-privesc").unwrap().provider.as_str(), "aws");
    }

    #[test]
    fn test_resolve_failures_are_lab_not_found() {
        let (_temp, _mock, mut ctx) = project(&["aws/iam-privesc"]);

        for identifier in ["0", "2", "nope", "azure/iam-privesc"] {
            let err = ctx.resolve_lab(identifier).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<CoreError>(),
                Some(CoreError::LabNotFound(_))
            ));
        }
    }

    #[test]
    fn test_missing_var_files_is_config_error() {
        let (_temp, _mock, mut ctx) = project(&["azure/keyvault-dump"]);
        let lab = ctx.resolve_lab("keyvault-dump").unwrap();
        let provider = ctx.provider(&lab).unwrap();

        let err = ctx.var_files(&lab, provider.as_ref()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::MissingConfig(_))
        ));

        fs::write(lab.terraform_dir().join("terraform.tfvars"), "x = 1\n").unwrap();
        assert_eq!(ctx.var_files(&lab, provider.as_ref()).unwrap().len(), 1);
    }
}

//! Cloud provider configuration strategies.
//!
//! Each provider knows where its shared `config/common-<provider>.tfvars` lives,
//! which variable files a lab should be planned with, and how to read back the
//! configured region. [`ProviderFactory`] selects the strategy for a lab.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};
use vault_runner::CommandRunner;

use crate::error::{CoreError, CoreResult};
use crate::lab::{CloudProvider, Lab};

/// Lab-local variable file.
pub const LAB_VAR_FILE: &str = "terraform.tfvars";
/// Example variable file some labs ship instead of a concrete one.
pub const LAB_VAR_EXAMPLE_FILE: &str = "terraform.tfvars.example";

/// Provider-specific configuration behaviour.
pub trait Provider: Send + Sync {
    fn kind(&self) -> CloudProvider;

    /// Provider CLI checked by [`Provider::check_prerequisites`].
    fn cli_binary(&self) -> &'static str;

    fn config_filename(&self) -> &'static str;

    fn config_template(&self) -> &'static str;

    fn default_region(&self) -> &'static str;

    fn config_dir(&self) -> &Path;

    fn runner(&self) -> &dyn CommandRunner;

    /// Whether the provider CLI is installed and runnable.
    fn check_prerequisites(&self) -> bool {
        let available = self.runner().probe(self.cli_binary(), &["--version"]);
        if !available {
            warn!(
                "{} CLI ({}) not found; install it before deploying {} labs",
                self.kind(),
                self.cli_binary(),
                self.kind()
            );
        }
        available
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir().join(self.config_filename())
    }

    /// Shared config (if present) followed by the lab's own variable file.
    fn var_files(&self, lab: &Lab) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let common = self.config_path();
        if common.exists() {
            files.push(common);
        }

        let lab_vars = lab.terraform_dir().join(LAB_VAR_FILE);
        if lab_vars.exists() {
            files.push(lab_vars);
        }

        files
    }

    /// Region from `<provider>_region = "..."` in the shared config, or the
    /// provider default.
    fn region(&self) -> String {
        let key = format!("{}_region", self.kind());
        fs::read_to_string(self.config_path())
            .ok()
            .and_then(|content| parse_assignment(&content, &key))
            .unwrap_or_else(|| self.default_region().to_string())
    }

    /// Write the config template if no shared config exists yet.
    fn ensure_config_exists(&self) -> CoreResult<PathBuf> {
        let path = self.config_path();
        if !path.exists() {
            fs::create_dir_all(self.config_dir())?;
            fs::write(&path, self.config_template())?;
            info!("Created {} configuration at {:?}", self.kind(), path);
        }
        Ok(path)
    }
}

fn parse_assignment(content: &str, key: &str) -> Option<String> {
    let pattern = format!(r#"(?m)^[ \t]*{}[ \t]*=[ \t]*"?([A-Za-z0-9_-]+)"?"#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

struct ProviderBase {
    config_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

/// Amazon Web Services.
pub struct AwsProvider {
    base: ProviderBase,
}

impl AwsProvider {
    pub fn new(config_dir: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            base: ProviderBase {
                config_dir: config_dir.into(),
                runner,
            },
        }
    }
}

impl Provider for AwsProvider {
    fn kind(&self) -> CloudProvider {
        CloudProvider::Aws
    }

    fn cli_binary(&self) -> &'static str {
        "aws"
    }

    fn config_filename(&self) -> &'static str {
        "common-aws.tfvars"
    }

    fn config_template(&self) -> &'static str {
        "aws_region = \"us-east-1\"\nallowed_source_ips = [\"YOUR_IP/32\"]\n"
    }

    fn default_region(&self) -> &'static str {
        "us-east-1"
    }

    fn config_dir(&self) -> &Path {
        &self.base.config_dir
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.base.runner.as_ref()
    }

    /// AWS labs fall back to `terraform.tfvars.example` when no concrete
    /// variable file exists.
    fn var_files(&self, lab: &Lab) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let common = self.config_path();
        if common.exists() {
            files.push(common);
        }

        let lab_vars = lab.terraform_dir().join(LAB_VAR_FILE);
        let example = lab.terraform_dir().join(LAB_VAR_EXAMPLE_FILE);
        if lab_vars.exists() {
            files.push(lab_vars);
        } else if example.exists() {
            files.push(example);
        }

        files
    }
}

/// Microsoft Azure.
pub struct AzureProvider {
    base: ProviderBase,
}

impl AzureProvider {
    pub fn new(config_dir: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            base: ProviderBase {
                config_dir: config_dir.into(),
                runner,
            },
        }
    }
}

impl Provider for AzureProvider {
    fn kind(&self) -> CloudProvider {
        CloudProvider::Azure
    }

    fn cli_binary(&self) -> &'static str {
        "az"
    }

    fn config_filename(&self) -> &'static str {
        "common-azure.tfvars"
    }

    fn config_template(&self) -> &'static str {
        "azure_region = \"usgovvirginia\"\n"
    }

    fn default_region(&self) -> &'static str {
        "usgovvirginia"
    }

    fn config_dir(&self) -> &Path {
        &self.base.config_dir
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.base.runner.as_ref()
    }
}

/// Google Cloud Platform.
pub struct GcpProvider {
    base: ProviderBase,
}

impl GcpProvider {
    pub fn new(config_dir: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            base: ProviderBase {
                config_dir: config_dir.into(),
                runner,
            },
        }
    }
}

impl Provider for GcpProvider {
    fn kind(&self) -> CloudProvider {
        CloudProvider::Gcp
    }

    fn cli_binary(&self) -> &'static str {
        "gcloud"
    }

    fn config_filename(&self) -> &'static str {
        "common-gcp.tfvars"
    }

    fn config_template(&self) -> &'static str {
        "gcp_project = \"YOUR_PROJECT_ID\"\ngcp_region = \"us-east4\"\n"
    }

    fn default_region(&self) -> &'static str {
        "us-east4"
    }

    fn config_dir(&self) -> &Path {
        &self.base.config_dir
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.base.runner.as_ref()
    }
}

type ProviderConstructor = fn(PathBuf, Arc<dyn CommandRunner>) -> Box<dyn Provider>;

const PROVIDERS: &[(CloudProvider, ProviderConstructor)] = &[
    (CloudProvider::Aws, aws),
    (CloudProvider::Azure, azure),
    (CloudProvider::Gcp, gcp),
];

fn aws(config_dir: PathBuf, runner: Arc<dyn CommandRunner>) -> Box<dyn Provider> {
    Box::new(AwsProvider::new(config_dir, runner))
}

fn azure(config_dir: PathBuf, runner: Arc<dyn CommandRunner>) -> Box<dyn Provider> {
    Box::new(AzureProvider::new(config_dir, runner))
}

fn gcp(config_dir: PathBuf, runner: Arc<dyn CommandRunner>) -> Box<dyn Provider> {
    Box::new(GcpProvider::new(config_dir, runner))
}

/// Builds the [`Provider`] for a [`CloudProvider`].
#[derive(Clone)]
pub struct ProviderFactory {
    config_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl ProviderFactory {
    pub fn new(config_dir: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config_dir: config_dir.into(),
            runner,
        }
    }

    pub fn get(&self, provider: CloudProvider) -> CoreResult<Box<dyn Provider>> {
        PROVIDERS
            .iter()
            .find(|(kind, _)| *kind == provider)
            .map(|(_, construct)| construct(self.config_dir.clone(), self.runner.clone()))
            .ok_or_else(|| CoreError::UnsupportedProvider(provider.to_string()))
    }

    /// Provider for a lab.
    pub fn for_lab(&self, lab: &Lab) -> CoreResult<Box<dyn Provider>> {
        self.get(lab.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vault_runner::MockRunner;

    fn factory(config_dir: &Path, runner: MockRunner) -> ProviderFactory {
        ProviderFactory::new(config_dir, Arc::new(runner))
    }

    fn lab_in(dir: &Path, provider: CloudProvider) -> Lab {
        let lab_dir = dir.join("labs").join(provider.as_str()).join("demo");
        fs::create_dir_all(&lab_dir).unwrap();
        Lab::new("demo", lab_dir, provider)
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let temp = tempdir().unwrap();
        let result = factory(temp.path(), MockRunner::new()).get(CloudProvider::Unknown);
        assert!(matches!(result, Err(CoreError::UnsupportedProvider(p)) if p == "unknown"));
    }

    #[test]
    fn test_var_files_order_and_aws_example_fallback() {
        let temp = tempdir().unwrap();
        let config_dir = temp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("common-aws.tfvars"), "aws_region = \"eu-west-1\"\n").unwrap();

        let lab = lab_in(temp.path(), CloudProvider::Aws);
        fs::write(lab.path.join(LAB_VAR_EXAMPLE_FILE), "x = 1\n").unwrap();

        let aws = factory(&config_dir, MockRunner::new()).get(CloudProvider::Aws).unwrap();
        assert_eq!(
            aws.var_files(&lab),
            vec![config_dir.join("common-aws.tfvars"), lab.path.join(LAB_VAR_EXAMPLE_FILE)]
        );

        fs::write(lab.path.join(LAB_VAR_FILE), "x = 2\n").unwrap();
        assert_eq!(
            aws.var_files(&lab),
            vec![config_dir.join("common-aws.tfvars"), lab.path.join(LAB_VAR_FILE)]
        );
    }

    #[test]
    fn test_azure_has_no_example_fallback() {
        let temp = tempdir().unwrap();
        let lab = lab_in(temp.path(), CloudProvider::Azure);
        fs::write(lab.path.join(LAB_VAR_EXAMPLE_FILE), "x = 1\n").unwrap();

        let azure = factory(temp.path(), MockRunner::new()).for_lab(&lab).unwrap();
        assert!(azure.var_files(&lab).is_empty());
    }

    #[test]
    fn test_region_parsing_and_defaults() {
        let temp = tempdir().unwrap();
        let providers = factory(temp.path(), MockRunner::new());

        let gcp = providers.get(CloudProvider::Gcp).unwrap();
        assert_eq!(gcp.region(), "us-east4");

        fs::write(
            temp.path().join("common-gcp.tfvars"),
            "# gcp_region = \"commented\"\ngcp_project = \"p\"\n  gcp_region   =  \"europe-west4\"\n",
        )
        .unwrap();
        assert_eq!(gcp.region(), "europe-west4");

        fs::write(temp.path().join("common-azure.tfvars"), "azure_region = \n").unwrap();
        let azure = providers.get(CloudProvider::Azure).unwrap();
        assert_eq!(azure.region(), "usgovvirginia");
    }

    #[test]
    fn test_ensure_config_exists_writes_template_once() {
        let temp = tempdir().unwrap();
        let config_dir = temp.path().join("config");
        let aws = factory(&config_dir, MockRunner::new()).get(CloudProvider::Aws).unwrap();

        let path = aws.ensure_config_exists().unwrap();
        assert_eq!(path, config_dir.join("common-aws.tfvars"));
        assert_eq!(aws.region(), "us-east-1");

        fs::write(&path, "aws_region = \"ap-south-1\"\n").unwrap();
        aws.ensure_config_exists().unwrap();
        assert_eq!(aws.region(), "ap-south-1");
    }

    #[test]
    fn test_check_prerequisites_uses_runner() {
        let temp = tempdir().unwrap();
        let runner = MockRunner::new().missing_program("az");
        let providers = factory(temp.path(), runner.clone());

        assert!(providers.get(CloudProvider::Aws).unwrap().check_prerequisites());
        assert!(!providers.get(CloudProvider::Azure).unwrap().check_prerequisites());

        let calls = runner.get_calls();
        assert_eq!(calls[0].program, "aws");
        assert_eq!(calls[0].args, vec!["--version"]);
        assert_eq!(calls[1].program, "az");
    }
}

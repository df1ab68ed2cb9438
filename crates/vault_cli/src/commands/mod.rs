//! CLI command definitions.
//!
//! Each subcommand maps to one step of the lab lifecycle.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use vault_core::DeploymentStatus;

pub mod active;
pub mod chains;
pub mod check;
pub mod cleanup;
pub mod deploy;
pub mod destroy;
pub mod info;
pub mod init;
pub mod list;
pub mod outputs;
pub mod plan;
pub mod search;
pub mod status;
pub mod validate;

/// VAULT - vulnerable cloud lab deployment tool
#[derive(Parser)]
#[command(name = "vault")]
#[command(version, about = "VAULT - deploy and tear down vulnerable cloud security labs")]
#[command(long_about = r#"
VAULT manages a catalog of intentionally vulnerable cloud labs. Each lab is a
Terraform project under labs/<provider>/<name>/ with its own state file.

WORKFLOWS:
  list / search → Browse the lab catalog
  info          → Show a lab's README details and deployment status
  plan          → Preview what a deploy (or --destroy) would change
  deploy        → Plan, confirm and apply a lab
  destroy       → Tear a lab down after typed confirmation
  outputs       → Show outputs of deployed labs
  status        → Show a lab's status and key resources
  active        → List every lab with live resources
  cleanup       → Remove empty state files
  check         → Verify Terraform and provider CLIs are installed
  chains        → Show attack-chain walkthroughs

LABS can be given as a 1-based index from `vault list`, a full path such
as aws/iam-privesc, or a bare lab name.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or unknown lab
  3 - Missing configuration
  5 - IaC error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project root containing labs/, config/ and .state/
    #[arg(long, global = true, env = "VAULT_PROJECT", default_value = ".")]
    pub project: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List labs, optionally filtered by a search query
    List(list::ListArgs),

    /// Search labs by name, description and objectives
    Search(search::SearchArgs),

    /// Show details for a lab
    Info(LabArgs),

    /// Initialize Terraform for a lab
    Init(LabArgs),

    /// Show the Terraform plan for a lab
    Plan(plan::PlanArgs),

    /// Deploy a lab
    Deploy(deploy::DeployArgs),

    /// Destroy a deployed lab
    Destroy(destroy::DestroyArgs),

    /// Show outputs of one deployed lab, or of all active labs
    Outputs(outputs::OutputsArgs),

    /// Show deployment status and key resources of a lab
    Status(LabArgs),

    /// List active deployments
    Active,

    /// Remove state files that track no resources
    Cleanup,

    /// Run terraform validate for a lab
    Validate(LabArgs),

    /// Check that Terraform and the provider CLIs are installed
    Check(check::CheckArgs),

    /// List attack chains, or walk through one for a deployed lab
    Chains(chains::ChainsArgs),
}

/// Arguments for commands that act on a single lab.
#[derive(Args)]
pub struct LabArgs {
    /// Lab index, path (aws/iam-privesc) or name
    pub lab: String,
}

pub(crate) fn status_icon(status: DeploymentStatus) -> &'static str {
    match status {
        DeploymentStatus::Deployed => "🟢",
        DeploymentStatus::Partial => "🟡",
        DeploymentStatus::Error => "🔴",
        DeploymentStatus::NotDeployed => "⚪",
    }
}

//! Outputs command - Show Terraform outputs of deployed labs.

use anyhow::Result;
use clap::Args;
use tracing::warn;

use vault_core::Lab;
use vault_iac::TerraformRunner;

use crate::context::VaultContext;
use crate::error::CliError;

#[derive(Args)]
pub struct OutputsArgs {
    /// Lab index, path or name; all active labs when omitted
    lab: Option<String>,

    /// Show sensitive values
    #[arg(long)]
    sensitive: bool,
}

pub fn execute(args: OutputsArgs, ctx: &mut VaultContext) -> Result<()> {
    let terraform = ctx.terraform()?;

    if let Some(identifier) = args.lab {
        let lab = ctx.resolve_lab(&identifier)?;
        if !ctx.state.is_deployed(&lab) {
            return Err(CliError::NotDeployed(lab.relative_path()).into());
        }
        print_outputs(&terraform, &lab, args.sensitive);
        return Ok(());
    }

    let active = ctx.state.active_deployments();
    if active.is_empty() {
        println!("📭 No active deployments");
        return Ok(());
    }

    for (path, _) in active {
        match ctx.resolve_lab(&path) {
            Ok(lab) => print_outputs(&terraform, &lab, args.sensitive),
            Err(e) => warn!("Skipping {}: {}", path, e),
        }
        println!();
    }
    Ok(())
}

fn print_outputs(terraform: &TerraformRunner, lab: &Lab, show_sensitive: bool) {
    let outputs = terraform.outputs(lab);
    println!("📤 {}", lab);
    if outputs.is_empty() {
        println!("   (no outputs)");
        return;
    }
    for (name, output) in &outputs {
        println!("   {} = {}", name, output.display_value(show_sensitive));
    }
}

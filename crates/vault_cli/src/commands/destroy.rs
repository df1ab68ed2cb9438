//! Destroy command - Tear a lab down.

use anyhow::Result;
use clap::Args;
use tracing::info;

use vault_core::LabAction;

use crate::context::VaultContext;
use crate::error::CliError;
use crate::prompt;

#[derive(Args)]
pub struct DestroyArgs {
    /// Lab index, path (aws/iam-privesc) or name
    lab: String,

    /// Skip the typed confirmation
    #[arg(short, long)]
    yes: bool,
}

pub fn execute(args: DestroyArgs, ctx: &mut VaultContext) -> Result<()> {
    let terraform = ctx.terraform()?;
    let lab = ctx.resolve_lab(&args.lab)?;

    if !ctx.state.is_deployed(&lab) {
        return Err(CliError::NotDeployed(lab.relative_path()).into());
    }

    let provider = ctx.provider(&lab)?;
    let var_files = ctx.var_files(&lab, provider.as_ref())?;

    println!(
        "⚠️  This destroys {} resource(s) of {}",
        ctx.state.resource_count(&lab),
        lab
    );
    if !args.yes && !prompt::confirm_typed(&lab.name)? {
        println!("Destroy cancelled");
        return Ok(());
    }

    println!("🧨 Destroying {}...", lab);
    if !terraform.destroy(&lab, &var_files, true)? {
        return Err(CliError::DestroyFailed(lab.relative_path()).into());
    }

    ctx.state.save_metadata(
        &lab,
        LabAction::Destroyed,
        &ctx.settings.operator(),
        &provider.region(),
    )?;
    info!("Destroyed {}", lab);

    println!("✅ Destroyed {}", lab);
    Ok(())
}

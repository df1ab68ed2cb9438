//! Plan command - Show the Terraform plan for a lab.

use anyhow::Result;
use clap::Args;

use crate::context::VaultContext;

#[derive(Args)]
pub struct PlanArgs {
    /// Lab index, path (aws/iam-privesc) or name
    lab: String,

    /// Plan a destroy instead of an apply
    #[arg(long)]
    destroy: bool,
}

pub fn execute(args: PlanArgs, ctx: &mut VaultContext) -> Result<()> {
    let terraform = ctx.terraform()?;
    let lab = ctx.resolve_lab(&args.lab)?;
    let provider = ctx.provider(&lab)?;
    let var_files = ctx.var_files(&lab, provider.as_ref())?;

    println!("📋 Planning {}{}...", lab, if args.destroy { " (destroy)" } else { "" });
    let plan = terraform.plan(&lab, &var_files, args.destroy)?;
    println!("{}", plan);
    Ok(())
}

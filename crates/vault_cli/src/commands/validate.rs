//! Validate command - Run terraform validate for a lab.

use anyhow::Result;

use super::LabArgs;
use crate::context::VaultContext;
use crate::error::CliError;

pub fn execute(args: LabArgs, ctx: &mut VaultContext) -> Result<()> {
    let terraform = ctx.terraform()?;
    let lab = ctx.resolve_lab(&args.lab)?;

    println!("🔎 Validating {}...", lab);
    let (valid, text) = terraform.validate(&lab)?;
    if !text.is_empty() {
        println!("{}", text);
    }

    if !valid {
        return Err(CliError::ValidationFailed(lab.relative_path()).into());
    }
    println!("✅ {} is valid", lab);
    Ok(())
}

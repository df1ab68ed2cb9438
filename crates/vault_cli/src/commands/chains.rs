//! Chains command - List attack chains or walk through one.

use anyhow::Result;
use clap::Args;

use vault_iac::output_values;

use crate::context::VaultContext;
use crate::error::CliError;

#[derive(Args)]
pub struct ChainsArgs {
    /// Deployed lab to walk through; lists all chains when omitted
    lab: Option<String>,
}

pub fn execute(args: ChainsArgs, ctx: &mut VaultContext) -> Result<()> {
    let Some(identifier) = args.lab else {
        println!("⛓️  Attack chains:");
        for key in ctx.chains.list() {
            let available = ctx.discovery.get_by_path(&key.to_string()).is_some();
            println!("   {} {}", if available { "✅" } else { "  " }, key);
        }
        return Ok(());
    };

    let lab = ctx.resolve_lab(&identifier)?;
    if !ctx.chains.contains(&lab) {
        return Err(CliError::InvalidArgument(format!("no attack chain for {}", lab)).into());
    }
    if !ctx.state.is_deployed(&lab) {
        return Err(CliError::NotDeployed(lab.relative_path()).into());
    }

    let terraform = ctx.terraform()?;
    let outputs = output_values(&terraform.outputs(&lab));
    let Some(chain) = ctx.chains.create(&lab, outputs) else {
        return Err(CliError::InvalidArgument(format!("no attack chain for {}", lab)).into());
    };

    println!("⛓️  {}", chain.title());
    let preflight = chain.preflight();
    if !preflight.is_ready() {
        println!("   ⚠️  Missing outputs: {}", preflight.missing.join(", "));
    }

    println!();
    for (step, phase) in chain.phases().iter().enumerate() {
        let icon = if phase.ready { "▶" } else { "⏸" };
        println!("   {} {}. {}", icon, step + 1, phase.name);
        println!("        {}", phase.description);
    }
    Ok(())
}

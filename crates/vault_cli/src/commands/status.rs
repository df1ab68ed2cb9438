//! Status command - Show a lab's deployment status and key resources.

use anyhow::Result;
use tracing::warn;

use vault_iac::key_resources;

use super::{status_icon, LabArgs};
use crate::context::VaultContext;

pub fn execute(args: LabArgs, ctx: &mut VaultContext) -> Result<()> {
    let lab = ctx.resolve_lab(&args.lab)?;
    let status = ctx.state.deployment_status(&lab);

    println!("{} {} - {}", status_icon(status), lab, status);
    println!("   Resources: {}", ctx.state.resource_count(&lab));
    println!("   State:     {}", ctx.state.tfstate_path(&lab).display());

    if let Some(metadata) = ctx.state.load_metadata(&lab) {
        println!(
            "   Last:      {} by {} at {} UTC",
            metadata.last_action,
            metadata.deployed_by,
            metadata.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        println!("   Region:    {}", metadata.region);
    }

    if !ctx.state.is_deployed(&lab) {
        return Ok(());
    }

    let terraform = ctx.terraform()?;
    match terraform.state_list(&lab) {
        Ok(resources) => {
            println!();
            println!("🔑 Key resources:");
            for address in key_resources(&resources) {
                println!("   - {}", address);
            }
        }
        Err(e) => warn!("Could not list resources for {}: {}", lab, e),
    }
    Ok(())
}

//! Active command - List labs with live resources.

use anyhow::Result;
use chrono::Utc;

use crate::context::VaultContext;

pub fn execute(ctx: &mut VaultContext) -> Result<()> {
    let active = ctx.state.active_deployments();
    if active.is_empty() {
        println!("📭 No active deployments");
        return Ok(());
    }

    let now = Utc::now().naive_utc();
    println!("🟢 {} active deployment(s)\n", active.len());
    for (path, metadata) in active {
        let age = now.signed_duration_since(metadata.timestamp);
        println!(
            "   {:<40} {:>3} resources  {:<14} {} ({})",
            path,
            metadata.resources_count,
            metadata.region,
            metadata.deployed_by,
            format_age(age)
        );
    }
    Ok(())
}

fn format_age(age: chrono::Duration) -> String {
    if age.num_days() > 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}m ago", age.num_minutes().max(0))
    }
}

//! Info command - Show lab details.

use anyhow::Result;

use super::{status_icon, LabArgs};
use crate::context::VaultContext;

pub fn execute(args: LabArgs, ctx: &mut VaultContext) -> Result<()> {
    let lab = ctx.resolve_lab(&args.lab)?;
    let status = ctx.state.deployment_status(&lab);

    println!("🧪 {}", lab);
    println!("   Path:       {}", lab.path.display());
    if lab.difficulty.is_unknown() {
        println!("   Difficulty: Unknown");
    } else {
        println!("   Difficulty: {} {}", lab.difficulty.bar(10), lab.difficulty);
    }
    if !lab.estimated_time.is_empty() {
        println!("   Time:       {}", lab.estimated_time);
    }
    println!("   Status:     {} {}", status_icon(status), status);

    if !lab.description.is_empty() {
        println!();
        println!("{}", lab.description);
    }

    if !lab.learning_objectives.is_empty() {
        println!();
        println!("🎯 Learning objectives:");
        for objective in &lab.learning_objectives {
            println!("   - {}", objective);
        }
    }

    if let Some(metadata) = ctx.state.load_metadata(&lab) {
        println!();
        println!(
            "📝 Last {} by {} at {} UTC ({})",
            metadata.last_action,
            metadata.deployed_by,
            metadata.timestamp.format("%Y-%m-%d %H:%M:%S"),
            metadata.region
        );
    }

    if ctx.chains.contains(&lab) {
        println!();
        println!("⛓️  Attack chain available: vault chains {}", lab.relative_path());
    }

    Ok(())
}

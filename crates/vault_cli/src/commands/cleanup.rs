//! Cleanup command - Remove state files that track no resources.

use anyhow::Result;

use crate::context::VaultContext;

pub fn execute(ctx: &mut VaultContext) -> Result<()> {
    let cleaned = ctx.state.cleanup_empty_states();
    if cleaned == 0 {
        println!("✨ Nothing to clean");
    } else {
        println!("🧹 Removed {} empty state file(s)", cleaned);
    }
    Ok(())
}

//! List command - Show the lab catalog.

use anyhow::Result;
use clap::Args;

use vault_core::discovery::DEFAULT_MIN_SCORE;

use super::status_icon;
use crate::context::VaultContext;

#[derive(Args)]
pub struct ListArgs {
    /// Only show labs matching this query
    query: Option<String>,
}

pub fn execute(args: ListArgs, ctx: &mut VaultContext) -> Result<()> {
    if let Some(query) = args.query {
        let results = ctx.discovery.search(&query, None, None, DEFAULT_MIN_SCORE);
        if results.is_empty() {
            println!("🔍 No labs match '{}'", query);
            return Ok(());
        }
        for result in results {
            let status = ctx.state.deployment_status(&result.lab);
            println!(
                "{} {:<40} {:>5.1}  {}",
                status_icon(status),
                result.lab.relative_path(),
                result.score,
                result.lab.difficulty
            );
        }
        return Ok(());
    }

    let labs = ctx.discovery.discover(false).to_vec();
    if labs.is_empty() {
        println!("📭 No labs found in {:?}", ctx.discovery.labs_dir());
        return Ok(());
    }

    println!("📚 {} lab(s)\n", labs.len());
    for (index, lab) in labs.iter().enumerate() {
        let status = ctx.state.deployment_status(lab);
        println!(
            "{:>3}. {} {:<40} {}",
            index + 1,
            status_icon(status),
            lab.relative_path(),
            lab.difficulty
        );
    }
    Ok(())
}

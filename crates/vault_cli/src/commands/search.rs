//! Search command - Rank labs against a query.

use anyhow::Result;
use clap::Args;

use vault_core::discovery::DEFAULT_MIN_SCORE;
use vault_core::{CloudProvider, DifficultyLevel};

use crate::context::VaultContext;
use crate::error::CliError;

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    query: String,

    /// Only labs for this provider (aws, azure, gcp)
    #[arg(short, long)]
    provider: Option<String>,

    /// Only labs of this difficulty (easy, medium, hard, very-hard, nightmare)
    #[arg(short, long)]
    difficulty: Option<String>,

    /// Minimum similarity score (0-100)
    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    min_score: f64,
}

pub fn execute(args: SearchArgs, ctx: &mut VaultContext) -> Result<()> {
    let provider = args
        .provider
        .as_deref()
        .map(|p| {
            CloudProvider::parse(p)
                .filter(|p| *p != CloudProvider::Unknown)
                .ok_or_else(|| CliError::InvalidArgument(format!("unknown provider '{}'", p)))
        })
        .transpose()?;
    let difficulty = args
        .difficulty
        .as_deref()
        .map(|d| {
            DifficultyLevel::parse(d)
                .ok_or_else(|| CliError::InvalidArgument(format!("unknown difficulty '{}'", d)))
        })
        .transpose()?;

    let results = ctx
        .discovery
        .search(&args.query, provider, difficulty, args.min_score);

    if results.is_empty() {
        println!("🔍 No labs match '{}'", args.query);
        return Ok(());
    }

    println!("🔍 {} result(s) for '{}'\n", results.len(), args.query);
    for result in results {
        println!(
            "  {:>5.1}  {:<40} [{}]",
            result.score,
            result.lab.relative_path(),
            result.matched_fields.join(", ")
        );
        if !result.lab.description.is_empty() {
            println!("         {}", result.lab.description);
        }
    }
    Ok(())
}

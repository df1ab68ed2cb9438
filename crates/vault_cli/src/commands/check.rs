//! Check command - Verify required tooling and configuration.

use anyhow::Result;
use clap::Args;

use vault_core::CloudProvider;

use crate::context::VaultContext;
use crate::error::CliError;

#[derive(Args)]
pub struct CheckArgs {
    /// Write a template config/common-<provider>.tfvars for providers that have none
    #[arg(long)]
    create_config: bool,
}

pub fn execute(args: CheckArgs, ctx: &mut VaultContext) -> Result<()> {
    println!("🔧 Checking prerequisites for {}...", ctx.layout.root().display());

    let terraform_ok = match ctx.terraform() {
        Ok(_) => {
            println!("   ✅ {}", ctx.settings.terraform_binary);
            true
        }
        Err(e) => {
            println!("   ❌ {}: {:#}", ctx.settings.terraform_binary, e);
            false
        }
    };

    for kind in CloudProvider::all() {
        let provider = ctx.providers.get(kind)?;
        if args.create_config && !provider.config_path().exists() {
            let path = provider.ensure_config_exists()?;
            println!("   📝 Wrote {}; edit it before deploying {} labs", path.display(), kind);
        }

        let cli = if provider.check_prerequisites() { "✅" } else { "⚠️ " };
        let config = if provider.config_path().exists() {
            format!("region {}", provider.region())
        } else {
            format!("no {}", provider.config_filename())
        };
        println!("   {} {:<7} {:<8} {}", cli, kind.as_str(), provider.cli_binary(), config);
    }

    if !terraform_ok {
        return Err(CliError::MissingPrerequisite {
            provider: "IaC".to_string(),
            binary: ctx.settings.terraform_binary.clone(),
        }
        .into());
    }
    Ok(())
}

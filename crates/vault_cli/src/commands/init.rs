//! Init command - Initialize Terraform for a lab.

use anyhow::Result;
use tracing::info;

use super::LabArgs;
use crate::context::VaultContext;

pub fn execute(args: LabArgs, ctx: &mut VaultContext) -> Result<()> {
    let terraform = ctx.terraform()?;
    let lab = ctx.resolve_lab(&args.lab)?;
    let provider = ctx.provider(&lab)?;
    ctx.require_prerequisites(provider.as_ref())?;

    info!("Initializing {}", lab);
    terraform.init(&lab)?;

    println!("✅ Initialized {}", lab);
    println!("   State: {}", ctx.state.tfstate_path(&lab).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context::tests::project;
    use crate::error::CliError;

    fn args(lab: &str) -> LabArgs {
        LabArgs {
            lab: lab.to_string(),
        }
    }

    #[test]
    fn test_init_checks_provider_cli_first() {
        let (_temp, mock, mut ctx) = project(&["gcp/bucket-leak"]);

        execute(args("bucket-leak"), &mut ctx).unwrap();
        assert_eq!(mock.subcommands(), vec!["version", "--version", "init"]);
        assert_eq!(mock.get_calls()[1].program, "gcloud");
    }

    #[test]
    fn test_init_refuses_without_provider_cli() {
        let (_temp, mock, mut ctx) = project(&["gcp/bucket-leak"]);
        let _ = mock.clone().missing_program("gcloud");

        let err = execute(args("bucket-leak"), &mut ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::MissingPrerequisite { .. })
        ));
        assert!(mock.calls_for("init").is_empty());
    }
}

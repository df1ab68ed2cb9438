//! Deploy command - Plan, confirm and apply a lab.

use anyhow::Result;
use clap::Args;
use tracing::info;

use vault_core::LabAction;

use crate::context::VaultContext;
use crate::error::CliError;
use crate::prompt;

#[derive(Args)]
pub struct DeployArgs {
    /// Lab index, path (aws/iam-privesc) or name
    lab: String,

    /// Skip confirmation prompts
    #[arg(short, long)]
    yes: bool,
}

pub fn execute(args: DeployArgs, ctx: &mut VaultContext) -> Result<()> {
    let terraform = ctx.terraform()?;
    let lab = ctx.resolve_lab(&args.lab)?;
    let provider = ctx.provider(&lab)?;

    ctx.require_prerequisites(provider.as_ref())?;

    let var_files = ctx.var_files(&lab, provider.as_ref())?;
    for file in &var_files {
        println!("📄 Using {}", file.display());
    }

    if ctx.state.is_deployed(&lab)
        && !args.yes
        && !prompt::confirm(&format!("{} is already deployed. Apply again?", lab))?
    {
        println!("Deployment cancelled");
        return Ok(());
    }

    println!("📋 Planning {}...", lab);
    let plan = terraform.plan(&lab, &var_files, false)?;
    println!("{}", plan);

    if !args.yes && !prompt::confirm(&format!("Deploy {}?", lab))? {
        println!("Deployment cancelled");
        return Ok(());
    }

    println!("🚀 Deploying {}...", lab);
    let result = terraform.apply(&lab, &var_files, true)?;
    if !result.success {
        return Err(CliError::DeploymentFailed {
            lab: lab.relative_path(),
            message: result.error_message.unwrap_or_default(),
        }
        .into());
    }

    let region = provider.region();
    let metadata = ctx.state.save_metadata(
        &lab,
        LabAction::Deployed,
        &ctx.settings.operator(),
        &region,
    )?;
    info!("Deployed {} by {}", lab, metadata.deployed_by);

    println!();
    println!(
        "✅ Deployed {} ({} resources, region {})",
        lab, result.resources_created, region
    );

    if !result.outputs.is_empty() {
        println!();
        println!("📤 Outputs:");
        for (name, output) in &result.outputs {
            println!("   {} = {}", name, output.display_value(false));
        }
    }

    if ctx.chains.contains(&lab) {
        println!();
        println!("⛓️  Next: vault chains {}", lab.relative_path());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use vault_core::CoreError;
    use vault_runner::MockResponse;

    use crate::context::tests::project;

    fn args(lab: &str) -> DeployArgs {
        DeployArgs {
            lab: lab.to_string(),
            yes: true,
        }
    }

    fn write_config(ctx: &VaultContext, content: &str) {
        fs::write(ctx.layout.config_dir().join("common-aws.tfvars"), content).unwrap();
    }

    #[test]
    fn test_deploy_records_metadata() {
        let (_temp, mock, mut ctx) = project(&["aws/demo"]);
        write_config(&ctx, "aws_region = \"eu-west-1\"\n");
        let lab = ctx.resolve_lab("aws/demo").unwrap();

        let tfstate = ctx.state.tfstate_path(&lab);
        fs::create_dir_all(tfstate.parent().unwrap()).unwrap();
        fs::write(&tfstate, r#"{"resources": [{}, {}], "outputs": {"url": {"value": "http://10.0.0.5"}}}"#).unwrap();

        execute(args("aws/demo"), &mut ctx).unwrap();

        assert_eq!(
            mock.subcommands(),
            vec!["version", "--version", "init", "plan", "init", "apply"]
        );
        let metadata = ctx.state.load_metadata(&lab).unwrap();
        assert_eq!(metadata.last_action, LabAction::Deployed);
        assert_eq!(metadata.region, "eu-west-1");
        assert_eq!(metadata.resources_count, 2);
    }

    #[test]
    fn test_missing_var_files_blocks_before_terraform() {
        let (_temp, mock, mut ctx) = project(&["aws/demo"]);

        let err = execute(args("demo"), &mut ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::MissingConfig(_))
        ));
        assert_eq!(mock.subcommands(), vec!["version", "--version"]);
    }

    #[test]
    fn test_missing_provider_cli() {
        let (_temp, mock, mut ctx) = project(&["aws/demo"]);
        write_config(&ctx, "aws_region = \"us-east-1\"\n");
        let _ = mock.clone().missing_program("aws");

        let err = execute(args("demo"), &mut ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::MissingPrerequisite { .. })
        ));
        assert!(mock.calls_for("init").is_empty());
    }

    #[test]
    fn test_failed_apply_records_nothing() {
        let (_temp, mock, mut ctx) = project(&["aws/demo"]);
        write_config(&ctx, "aws_region = \"us-east-1\"\n");
        let _ = mock.clone().respond_to(
            "terraform",
            &["apply"],
            MockResponse::failure(1, "Error: AccessDenied"),
        );

        let err = execute(args("demo"), &mut ctx).unwrap_err();
        match err.downcast_ref::<CliError>() {
            Some(CliError::DeploymentFailed { message, .. }) => {
                assert_eq!(message, "Error: AccessDenied")
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let lab = ctx.resolve_lab("demo").unwrap();
        assert!(ctx.state.load_metadata(&lab).is_none());
    }
}

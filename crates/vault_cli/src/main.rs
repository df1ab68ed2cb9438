//! VAULT CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or unknown lab
//! - 3: Missing configuration
//! - 5: IaC error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod context;
mod error;
mod prompt;

use commands::{Cli, Commands};
use context::VaultContext;
use error::CliError;
use vault_core::CoreError;
use vault_iac::IacError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const MISSING_CONFIG: u8 = 3;
    pub const IAC_ERROR: u8 = 5;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = VaultContext::open(&cli.project).and_then(|mut ctx| run(cli.command, &mut ctx));

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "vault=debug" } else { "vault=info" };
    let mut filter = EnvFilter::from_default_env();
    for directive in [level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Already initialized in tests or embedding contexts
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}

fn run(command: Commands, ctx: &mut VaultContext) -> anyhow::Result<()> {
    match command {
        Commands::List(args) => commands::list::execute(args, ctx),
        Commands::Search(args) => commands::search::execute(args, ctx),
        Commands::Info(args) => commands::info::execute(args, ctx),
        Commands::Init(args) => commands::init::execute(args, ctx),
        Commands::Plan(args) => commands::plan::execute(args, ctx),
        Commands::Deploy(args) => commands::deploy::execute(args, ctx),
        Commands::Destroy(args) => commands::destroy::execute(args, ctx),
        Commands::Outputs(args) => commands::outputs::execute(args, ctx),
        Commands::Status(args) => commands::status::execute(args, ctx),
        Commands::Active => commands::active::execute(ctx),
        Commands::Cleanup => commands::cleanup::execute(ctx),
        Commands::Validate(args) => commands::validate::execute(args, ctx),
        Commands::Check(args) => commands::check::execute(args, ctx),
        Commands::Chains(args) => commands::chains::execute(args, ctx),
    }
}

/// Map an error to its exit code by the first typed cause in the chain.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<CliError>() {
            return err.exit_code();
        }
        if let Some(err) = cause.downcast_ref::<CoreError>() {
            return match err {
                CoreError::LabNotFound(_) | CoreError::UnsupportedProvider(_) => {
                    ExitCodes::INVALID_ARGS
                }
                CoreError::MissingConfig(_) | CoreError::InvalidSettings(_) | CoreError::Toml(_) => {
                    ExitCodes::MISSING_CONFIG
                }
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if cause.downcast_ref::<IacError>().is_some() {
            return ExitCodes::IAC_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}

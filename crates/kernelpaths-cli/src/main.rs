//! CLI entry point.
//!
//! Parses arguments, installs logging, then hands the command to the
//! handlers over the context built by bootstrap.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use kernelpaths_cli::{Cli, CliConfig, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // No command provided - show help
    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = match bootstrap(CliConfig::from_cli(&cli)).await {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    handlers::dispatch(&ctx, command, cli.json).await
}

//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for inspecting Jupyter kernel search paths.
#[derive(Parser)]
#[command(name = "kernelpaths")]
#[command(about = "Resolve Jupyter kernel search paths and data directories")]
#[command(version)]
pub struct Cli {
    /// Config file (JSON); defaults to config.json under the data root
    #[arg(long, global = true, env = "KERNELPATHS_CONFIG")]
    pub config: Option<PathBuf>,

    /// `.env` file merged into the environment for this invocation
    #[arg(long = "env-file", global = true)]
    pub env_file: Option<PathBuf>,

    /// Python interpreter whose environment contributes data directories
    #[arg(long, global = true)]
    pub python: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "kernelpaths",
            "--verbose",
            "--python",
            "/opt/env/bin/python",
            "data-dirs",
            "--json",
        ]);
        assert!(cli.verbose);
        assert!(cli.json);
        assert_eq!(cli.python, Some(PathBuf::from("/opt/env/bin/python")));
        assert!(matches!(cli.command, Some(Commands::DataDirs { resource: None })));
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::parse_from(["kernelpaths", "--env-file", "/work/.env"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.env_file, Some(PathBuf::from("/work/.env")));
    }

    #[test]
    fn test_subcommand_args() {
        let cli = Cli::parse_from(["kernelpaths", "data-dirs", "--resource", "/work/nb.ipynb"]);
        assert!(matches!(
            cli.command,
            Some(Commands::DataDirs { resource: Some(ref r) }) if r == "/work/nb.ipynb"
        ));

        let cli = Cli::parse_from(["kernelpaths", "jupyter-paths", "--kernels"]);
        assert!(matches!(cli.command, Some(Commands::JupyterPaths { kernels: true })));
    }
}

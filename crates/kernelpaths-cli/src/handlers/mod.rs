//! Command handlers that delegate to the search-path service.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ..., json: bool) -> Result<()>`
//! - Thin wrappers that call the service and format output for the terminal
//!
//! Handlers should NOT resolve paths themselves or touch adapters directly.

pub mod data_dirs;
pub mod env;
pub mod jupyter_paths;
pub mod kernel_roots;
pub mod paths;
pub mod root_path;
pub mod runtime_dir;
pub mod temp_folder;

use anyhow::Result;
use kernelpaths_core::PathEntry;

use crate::bootstrap::CliContext;
use crate::commands::Commands;

/// Route a subcommand to its handler.
pub async fn dispatch(ctx: &CliContext, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Paths => paths::execute(ctx, json).await,
        Commands::DataDirs { resource } => data_dirs::execute(ctx, resource, json).await,
        Commands::Env => env::execute(ctx, json).await,
        Commands::KernelRoots => kernel_roots::execute(ctx, json).await,
        Commands::JupyterPaths { kernels } => jupyter_paths::execute(ctx, kernels, json).await,
        Commands::RuntimeDir => runtime_dir::execute(ctx, json).await,
        Commands::RootPath => root_path::execute(ctx, json).await,
        Commands::TempFolder => temp_folder::execute(ctx, json).await,
    }
}

/// One path per line, or a JSON array.
pub(crate) fn render_entries(entries: &[PathEntry], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(entries)?);
    }
    Ok(entries
        .iter()
        .map(PathEntry::to_string_lossy)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// A single path, `<none>` when absent, or a JSON string/null.
pub(crate) fn render_entry(entry: Option<&PathEntry>, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(&entry)?);
    }
    Ok(entry.map_or_else(|| "<none>".to_string(), PathEntry::to_string_lossy))
}

/// Print rendered output, skipping empty plain-text lists.
pub(crate) fn emit(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}

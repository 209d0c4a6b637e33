//! Jupyter-paths command handler.

use anyhow::Result;

use super::{emit, render_entries};
use crate::bootstrap::CliContext;

/// List `JUPYTER_PATH` entries, or their `kernels` subdirectories.
pub async fn execute(ctx: &CliContext, kernels: bool, json: bool) -> Result<()> {
    let service = ctx.service();
    let paths = if kernels {
        service.jupyter_kernel_paths().await
    } else {
        service.jupyter_paths().await
    };
    emit(&render_entries(&paths, json)?);
    Ok(())
}

//! Data-dirs command handler.

use anyhow::Result;

use super::{emit, render_entries};
use crate::bootstrap::CliContext;

/// List data directories for the selected interpreter, highest precedence first.
pub async fn execute(ctx: &CliContext, resource: Option<String>, json: bool) -> Result<()> {
    let dirs = ctx.service().data_dirs(&ctx.search_context(resource)).await;
    emit(&render_entries(&dirs, json)?);
    Ok(())
}

//! Runtime-dir command handler.

use anyhow::Result;

use super::{emit, render_entry};
use crate::bootstrap::CliContext;

pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let dir = ctx.service().runtime_dir().await;
    emit(&render_entry(Some(&dir), json)?);
    Ok(())
}

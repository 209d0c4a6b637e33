//! Root-path command handler.

use anyhow::Result;

use super::{emit, render_entry};
use crate::bootstrap::CliContext;

/// Show the writable kernelspec directory, `<none>` without a home directory.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let root = ctx.service().kernel_spec_root_path().await;
    emit(&render_entry(root.as_ref(), json)?);
    Ok(())
}

//! Temp-folder command handler.

use anyhow::Result;

use super::{emit, render_entry};
use crate::bootstrap::CliContext;

pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let folder = ctx.service().kernel_spec_temp_registration_folder().await;
    emit(&render_entry(Some(&folder), json)?);
    Ok(())
}

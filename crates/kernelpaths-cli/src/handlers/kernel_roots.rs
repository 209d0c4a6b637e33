//! Kernel-roots command handler.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{emit, render_entries};
use crate::bootstrap::CliContext;

/// List kernelspec search roots; Ctrl-C abandons the resolution.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupted; cancelling kernelspec root resolution");
                cancel.cancel();
            }
        })
    };

    let roots = ctx.service().kernel_spec_root_paths(&cancel).await;
    watcher.abort();

    if cancel.is_cancelled() {
        anyhow::bail!("Interrupted");
    }
    emit(&render_entries(&roots, json)?);
    Ok(())
}

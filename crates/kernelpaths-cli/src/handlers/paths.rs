//! Paths command handler.
//!
//! Displays every resolved location for diagnostics. This is the "golden
//! truth" tool for path resolution issues.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Resolve and display all locations in `key = value` format (or JSON).
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let report = ctx.service().report(&ctx.search_context(None)).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

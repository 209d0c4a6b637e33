//! Env command handler.

use std::collections::BTreeMap;

use anyhow::Result;
use kernelpaths_core::EnvironmentScope;

use crate::bootstrap::CliContext;

/// Show the variables the `.env` files contribute to Python processes.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let vars: BTreeMap<String, String> = ctx
        .environment
        .custom_variables(EnvironmentScope::RunPythonCode)
        .await?
        .into_iter()
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&vars)?);
    } else {
        for (name, value) in &vars {
            println!("{name}={value}");
        }
    }
    Ok(())
}

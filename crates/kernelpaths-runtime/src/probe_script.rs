//! Deployment of the embedded data-dir probe script.

use std::path::Path;

use kernelpaths_core::PortError;
use tracing::debug;

/// Source of the script that prints the interpreter's user-site Jupyter
/// data directory.
pub const PROBE_SCRIPT_SOURCE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/scripts/print_jupyter_data_dir.py"
));

/// Write the probe script to `path` unless an identical copy is already there.
pub async fn ensure_probe_script(path: &Path) -> Result<(), PortError> {
    if let Ok(existing) = tokio::fs::read_to_string(path).await {
        if existing == PROBE_SCRIPT_SOURCE {
            return Ok(());
        }
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PortError::io(parent, &e))?;
    }
    tokio::fs::write(path, PROBE_SCRIPT_SOURCE)
        .await
        .map_err(|e| PortError::io(path, &e))?;
    debug!(path = %path.display(), "Deployed data-dir probe script");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_checks_user_site() {
        assert!(PROBE_SCRIPT_SOURCE.contains("ENABLE_USER_SITE"));
        assert!(PROBE_SCRIPT_SOURCE.contains("USER_BASE"));
    }

    #[tokio::test]
    async fn test_deploys_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("print_jupyter_data_dir.py");

        ensure_probe_script(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PROBE_SCRIPT_SOURCE);
    }

    #[tokio::test]
    async fn test_replaces_stale_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("print_jupyter_data_dir.py");
        std::fs::write(&path, "print('old')").unwrap();

        ensure_probe_script(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PROBE_SCRIPT_SOURCE);
    }
}

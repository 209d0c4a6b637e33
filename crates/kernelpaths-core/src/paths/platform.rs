//! Application-owned roots: where kernelpaths keeps its own state and
//! temporary files.
//!
//! These are distinct from the Jupyter directories, which are resolved
//! through the ports so they can be exercised for any OS.

use std::env;
use std::fs;
use std::path::PathBuf;

use super::error::PathError;

const APP_DIR_NAME: &str = "kernelpaths";

/// Get the root directory for application state (persisted paths, config).
///
/// Resolution order:
/// 1. `KERNELPATHS_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/kernelpaths`)
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = data_root_from(env::var("KERNELPATHS_DATA_DIR").ok().as_deref())?;

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(root)
}

/// Get the root directory for temporary files (fallback runtime dir, temp
/// kernelspec registrations, the deployed probe script).
///
/// Resolution order:
/// 1. `KERNELPATHS_TEMP_DIR` environment variable
/// 2. `<os temp dir>/kernelpaths`
pub fn temp_root() -> PathBuf {
    temp_root_from(env::var("KERNELPATHS_TEMP_DIR").ok().as_deref())
}

pub(crate) fn data_root_from(override_dir: Option<&str>) -> Result<PathBuf, PathError> {
    if let Some(path) = override_dir.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join(APP_DIR_NAME))
}

pub(crate) fn temp_root_from(override_dir: Option<&str>) -> PathBuf {
    override_dir
        .filter(|p| !p.is_empty())
        .map_or_else(|| env::temp_dir().join(APP_DIR_NAME), PathBuf::from)
}

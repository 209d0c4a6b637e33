//! Single canonical Jupyter directories.
//!
//! Every function is a pure lookup over the platform facts, an environment
//! snapshot and (for Windows) real-path resolution. Absence is a valid
//! answer: no home directory means no home-relative directories.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use super::layout::{self, OsLayout, layout_for};
use crate::domain::{EnvVars, OsFamily, PathEntry, env_value};
use crate::ports::{FileSystemPort, PlatformInfo};

/// Resolves the per-user and system Jupyter directories.
#[derive(Clone)]
pub struct DirectoryResolver {
    platform: Arc<dyn PlatformInfo>,
    filesystem: Arc<dyn FileSystemPort>,
}

impl DirectoryResolver {
    pub fn new(platform: Arc<dyn PlatformInfo>, filesystem: Arc<dyn FileSystemPort>) -> Self {
        Self {
            platform,
            filesystem,
        }
    }

    pub fn os_family(&self) -> OsFamily {
        self.platform.os_family()
    }

    fn layout(&self) -> &'static OsLayout {
        layout_for(self.platform.os_family())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.platform.home_dir()
    }

    /// Whether the writable kernelspec root is part of the system kernelspec
    /// search list on this OS.
    pub fn search_includes_writable_root(&self) -> bool {
        self.layout().search_includes_writable_root
    }

    /// The writable kernelspec directory for the current user.
    pub async fn kernel_spec_root_path(&self) -> Option<PathEntry> {
        let home = self.home_dir()?;
        let layout = self.layout();
        let candidate = layout.kernel_spec_root(&home);
        if layout.real_path_required {
            self.filesystem.real_path(&candidate).await
        } else {
            Some(PathEntry::new(candidate))
        }
    }

    /// The runtime directory before any creation or write probe.
    ///
    /// `JUPYTER_RUNTIME_DIR` wins; otherwise the OS default under the home
    /// directory.
    pub async fn runtime_dir(&self, env: &EnvVars) -> Option<PathEntry> {
        if let Some(dir) = env_value(env, "JUPYTER_RUNTIME_DIR") {
            return Some(PathEntry::new(dir));
        }
        let Some(home) = self.home_dir() else {
            warn!("No home directory; cannot determine the Jupyter runtime directory");
            return None;
        };
        let layout = self.layout();
        let candidate = layout.runtime_dir(&home, env);
        if layout.real_path_required {
            let resolved = self.filesystem.real_path(&candidate).await;
            if resolved.is_none() {
                debug!(path = %candidate.display(), "Runtime directory does not resolve");
            }
            resolved
        } else {
            Some(PathEntry::new(candidate))
        }
    }

    /// The user data directory: `JUPYTER_DATA_DIR`, else the OS default.
    pub fn data_dir(&self, env: &EnvVars) -> Option<PathEntry> {
        if let Some(dir) = env_value(env, "JUPYTER_DATA_DIR") {
            return Some(PathEntry::new(dir));
        }
        let home = self.home_dir()?;
        Some(PathEntry::new(self.layout().data_dir(&home, env)))
    }

    /// The user config directory: `JUPYTER_CONFIG_DIR`, else `<home>/.jupyter`.
    pub fn config_dir(&self, env: &EnvVars) -> Option<PathEntry> {
        layout::config_dir(self.home_dir().as_deref(), env).map(PathEntry::new)
    }

    /// System-wide data directories, in precedence order.
    pub fn system_data_dirs(&self, env: &EnvVars) -> Vec<PathEntry> {
        self.layout()
            .system_data_dirs(env)
            .into_iter()
            .map(PathEntry::new)
            .collect()
    }

    /// System kernelspec directories, excluding the writable root.
    pub fn system_kernel_spec_dirs(&self, env: &EnvVars) -> Vec<PathEntry> {
        self.layout()
            .system_kernel_dirs(self.home_dir().as_deref(), env)
            .into_iter()
            .map(PathEntry::new)
            .collect()
    }
}

//! Platform query port.

use std::path::PathBuf;

use crate::domain::OsFamily;

/// Read-only facts about the host platform.
pub trait PlatformInfo: Send + Sync {
    /// The user's home directory, if one can be determined.
    fn home_dir(&self) -> Option<PathBuf>;

    /// The OS family whose directory conventions apply.
    fn os_family(&self) -> OsFamily;
}

//! Host platform facts.

use std::path::PathBuf;

use kernelpaths_core::{OsFamily, PlatformInfo};

/// The machine this process runs on.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPlatform;

impl HostPlatform {
    pub const fn new() -> Self {
        Self
    }
}

impl PlatformInfo for HostPlatform {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn os_family(&self) -> OsFamily {
        OsFamily::current()
    }
}

//! Filesystem probe port.

use std::path::Path;

use async_trait::async_trait;

use super::PortError;
use crate::domain::PathEntry;

/// The handful of filesystem operations path resolution needs.
#[async_trait]
pub trait FileSystemPort: Send + Sync {
    /// Create a directory and any missing parents. Succeeds if it exists.
    async fn create_directory(&self, path: &Path) -> Result<(), PortError>;

    async fn exists(&self, path: &Path) -> bool;

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), PortError>;

    async fn delete_file(&self, path: &Path) -> Result<(), PortError>;

    /// Canonical, symlink-free form of an existing path.
    ///
    /// Returns `None` when the path does not exist or cannot be resolved; the
    /// candidate is then dropped by callers.
    async fn real_path(&self, path: &Path) -> Option<PathEntry>;
}

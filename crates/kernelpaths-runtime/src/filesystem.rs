//! Filesystem port backed by `tokio::fs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kernelpaths_core::{FileSystemPort, PathEntry, PortError};
use tracing::trace;

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystemPort for TokioFileSystem {
    async fn create_directory(&self, path: &Path) -> Result<(), PortError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| PortError::io(path, &e))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), PortError> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| PortError::io(path, &e))
    }

    async fn delete_file(&self, path: &Path) -> Result<(), PortError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| PortError::io(path, &e))
    }

    async fn real_path(&self, path: &Path) -> Option<PathEntry> {
        match tokio::fs::canonicalize(path).await {
            Ok(resolved) => Some(PathEntry::new(strip_verbatim_prefix(resolved))),
            Err(e) => {
                trace!(path = %path.display(), error = %e, "Path does not resolve");
                None
            }
        }
    }
}

/// Turn `\\?\C:\x` (what Windows canonicalization returns) back into `C:\x`.
fn strip_verbatim_prefix(path: PathBuf) -> PathBuf {
    let stripped = path
        .to_str()
        .and_then(|text| text.strip_prefix(r"\\?\"))
        .filter(|rest| rest.as_bytes().get(1) == Some(&b':'))
        .map(PathBuf::from);
    stripped.unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_verbatim_prefix() {
        assert_eq!(
            strip_verbatim_prefix(PathBuf::from(r"\\?\C:\Users\u")),
            PathBuf::from(r"C:\Users\u")
        );
        assert_eq!(
            strip_verbatim_prefix(PathBuf::from(r"\\?\UNC\server\share")),
            PathBuf::from(r"\\?\UNC\server\share")
        );
        assert_eq!(
            strip_verbatim_prefix(PathBuf::from("/home/u")),
            PathBuf::from("/home/u")
        );
    }

    #[tokio::test]
    async fn test_create_write_delete() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let nested = dir.path().join("a").join("b");

        fs.create_directory(&nested).await.unwrap();
        fs.create_directory(&nested).await.unwrap();
        assert!(fs.exists(&nested).await);

        let file = nested.join("probe.txt");
        fs.write_file(&file, b"").await.unwrap();
        assert!(fs.exists(&file).await);
        fs.delete_file(&file).await.unwrap();
        assert!(!fs.exists(&file).await);
        assert!(fs.delete_file(&file).await.is_err());
    }

    #[tokio::test]
    async fn test_create_under_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "x").unwrap();

        let err = TokioFileSystem::new()
            .create_directory(&file.join("sub"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Io { .. }));
    }

    #[tokio::test]
    async fn test_real_path() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        assert!(fs.real_path(&dir.path().join("missing")).await.is_none());

        let resolved = fs.real_path(dir.path()).await.unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(resolved, PathEntry::new(strip_verbatim_prefix(expected)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_real_path_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fs = TokioFileSystem::new();
        assert_eq!(fs.real_path(&link).await, fs.real_path(&target).await);
    }
}

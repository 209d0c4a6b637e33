//! Directory creation and write-access verification through the filesystem port.

use std::path::Path;

use tracing::trace;
use uuid::Uuid;

use super::error::PathError;
use crate::ports::FileSystemPort;

/// Create `path` (and parents) if it does not exist.
pub async fn ensure_directory(
    filesystem: &dyn FileSystemPort,
    path: &Path,
) -> Result<(), PathError> {
    filesystem
        .create_directory(path)
        .await
        .map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Verify a directory is writable by creating and removing a uniquely named
/// empty file inside it.
///
/// Failing to remove the probe file is not an error.
pub async fn verify_writable(filesystem: &dyn FileSystemPort, dir: &Path) -> Result<(), PathError> {
    let probe = dir.join(probe_file_name());
    filesystem
        .write_file(&probe, b"")
        .await
        .map_err(|e| PathError::NotWritable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
    if let Err(e) = filesystem.delete_file(&probe).await {
        trace!(path = %probe.display(), error = %e, "Could not remove write probe");
    }
    Ok(())
}

fn probe_file_name() -> String {
    format!("temp-test-write-access-{}.txt", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFileSystem;

    #[tokio::test]
    async fn test_verify_writable_leaves_no_file_behind() {
        let fs = FakeFileSystem::new();
        fs.add_dir("/run/jupyter");
        verify_writable(&fs, Path::new("/run/jupyter")).await.unwrap();
        assert_eq!(fs.write_count(), 1);
        assert!(fs.files().is_empty());
    }

    #[tokio::test]
    async fn test_verify_writable_reports_read_only_dir() {
        let fs = FakeFileSystem::new();
        fs.add_dir("/ro");
        fs.set_read_only("/ro");
        let err = verify_writable(&fs, Path::new("/ro")).await.unwrap_err();
        assert!(matches!(err, PathError::NotWritable { .. }));
    }

    #[test]
    fn test_probe_names_are_unique() {
        let a = probe_file_name();
        assert!(a.starts_with("temp-test-write-access-"));
        assert!(a.ends_with(".txt"));
        assert_ne!(a, probe_file_name());
    }
}

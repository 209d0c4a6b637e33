//! `JUPYTER_PATH` parsing.

use std::path::Path;

use indexmap::IndexSet;
use tracing::debug;

use crate::domain::{EnvVars, OsFamily, PathEntry, env_value};
use crate::ports::FileSystemPort;

/// Split a `JUPYTER_PATH` value on the OS path delimiter, optionally joining
/// `subdir` onto each element. Empty elements are skipped.
pub fn split_jupyter_path(value: &str, os: OsFamily, subdir: Option<&str>) -> Vec<String> {
    value
        .split(os.path_delimiter())
        .filter(|item| !item.is_empty())
        .map(|item| match subdir {
            Some(subdir) => Path::new(item).join(subdir).to_string_lossy().into_owned(),
            None => item.to_string(),
        })
        .collect()
}

/// Real-path resolved `JUPYTER_PATH` entries, in declaration order without
/// duplicates. Entries that do not resolve are dropped.
pub async fn jupyter_path_entries(
    env: &EnvVars,
    os: OsFamily,
    subdir: Option<&str>,
    filesystem: &dyn FileSystemPort,
) -> Vec<PathEntry> {
    let Some(value) = env_value(env, "JUPYTER_PATH") else {
        return Vec::new();
    };

    let candidates = split_jupyter_path(value, os, subdir);
    let resolved = futures_util::future::join_all(
        candidates
            .iter()
            .map(|candidate| filesystem.real_path(Path::new(candidate))),
    )
    .await;

    let entries: IndexSet<PathEntry> = resolved.into_iter().flatten().collect();
    debug!(
        subdir = subdir.unwrap_or(""),
        count = entries.len(),
        "Resolved JUPYTER_PATH entries"
    );
    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFileSystem;

    #[test]
    fn test_split_uses_os_delimiter() {
        assert_eq!(
            split_jupyter_path("/a:/b", OsFamily::OtherUnix, None),
            vec!["/a".to_string(), "/b".to_string()]
        );
        assert_eq!(
            split_jupyter_path("C:\\a;C:\\b", OsFamily::Windows, None),
            vec!["C:\\a".to_string(), "C:\\b".to_string()]
        );
    }

    #[test]
    fn test_split_skips_empty_and_joins_subdir() {
        assert_eq!(
            split_jupyter_path("/a::/b:", OsFamily::OtherUnix, Some("kernels")),
            vec!["/a/kernels".to_string(), "/b/kernels".to_string()]
        );
    }

    #[tokio::test]
    async fn test_entries_drop_unresolvable_and_duplicates() {
        let fs = FakeFileSystem::new();
        fs.add_dir("/a/kernels");
        fs.add_dir("/b/kernels");
        let env: EnvVars = [("JUPYTER_PATH".to_string(), "/a:/missing:/b:/a".to_string())]
            .into_iter()
            .collect();

        let entries = jupyter_path_entries(&env, OsFamily::OtherUnix, Some("kernels"), &fs).await;
        assert_eq!(
            entries,
            vec![PathEntry::from("/a/kernels"), PathEntry::from("/b/kernels")]
        );
    }

    #[tokio::test]
    async fn test_entries_dedupe_on_resolved_path() {
        let fs = FakeFileSystem::new();
        fs.add_dir("/b");
        fs.add_alias("/link", "/a");
        let env: EnvVars = [("JUPYTER_PATH".to_string(), "/link:/a:/b".to_string())]
            .into_iter()
            .collect();

        let entries = jupyter_path_entries(&env, OsFamily::OtherUnix, None, &fs).await;
        assert_eq!(entries, vec![PathEntry::from("/a"), PathEntry::from("/b")]);
    }

    #[tokio::test]
    async fn test_unset_variable_yields_nothing() {
        let fs = FakeFileSystem::new();
        let entries = jupyter_path_entries(&EnvVars::new(), OsFamily::OtherUnix, None, &fs).await;
        assert!(entries.is_empty());
    }
}

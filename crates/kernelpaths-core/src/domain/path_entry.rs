//! Normalized filesystem location.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A filesystem location whose identity is its lexically normalized form.
///
/// Normalization drops `.` components, folds `..` against the preceding
/// normal component and strips trailing separators. Symlinks are not
/// followed here; real-path resolution is the job of
/// [`FileSystemPort::real_path`](crate::ports::FileSystemPort::real_path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathEntry(PathBuf);

impl PathEntry {
    /// Create an entry from any path, normalizing it lexically.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(normalize(path.as_ref()))
    }

    /// Join a relative path onto this entry.
    #[must_use]
    pub fn join(&self, child: impl AsRef<Path>) -> Self {
        Self::new(self.0.join(child))
    }

    /// Borrow the underlying path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Consume the entry and return the path.
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// String form used for persistence and string comparisons.
    pub fn to_string_lossy(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl AsRef<Path> for PathEntry {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for PathEntry {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for PathEntry {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<&str> for PathEntry {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

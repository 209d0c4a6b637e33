//! Operating-system family used to select a directory layout.

use serde::{Deserialize, Serialize};

/// The OS families whose Jupyter directory conventions are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Windows,
    MacOs,
    /// Linux, BSDs, AIX and every other non-macOS Unix.
    OtherUnix,
}

impl OsFamily {
    /// The family of the host this binary was compiled for.
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::OtherUnix
        }
    }

    /// Separator used by list-valued variables such as `JUPYTER_PATH`.
    pub const fn path_delimiter(self) -> char {
        match self {
            Self::Windows => ';',
            Self::MacOs | Self::OtherUnix => ':',
        }
    }

    pub const fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::OtherUnix => "unix",
        };
        f.write_str(name)
    }
}

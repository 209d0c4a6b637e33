//! Snapshot of every resolved location, for CLI introspection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{OsFamily, PathEntry};

/// All search locations captured in a single struct.
///
/// Use it for the `kernelpaths paths` command and for comparing resolution
/// across hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsReport {
    pub os: OsFamily,
    /// Writable kernelspec directory, when a home directory exists
    pub kernel_spec_root: Option<PathEntry>,
    /// Directory for connection files
    pub runtime_dir: PathEntry,
    /// Where kernelspecs are registered temporarily
    pub temp_registration_folder: PathEntry,
    pub config_dir: Option<PathEntry>,
    /// User data directory
    pub data_dir: Option<PathEntry>,
    /// Ordered data directories for the queried context
    pub data_dirs: Vec<PathEntry>,
    /// Ordered kernelspec search roots
    pub kernel_spec_root_paths: Vec<PathEntry>,
}

fn optional(entry: Option<&PathEntry>) -> String {
    entry.map_or_else(|| "<none>".to_string(), PathEntry::to_string_lossy)
}

fn list(entries: &[PathEntry]) -> String {
    entries
        .iter()
        .map(PathEntry::to_string_lossy)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for PathsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "os = {}", self.os)?;
        writeln!(
            f,
            "kernel_spec_root = {}",
            optional(self.kernel_spec_root.as_ref())
        )?;
        writeln!(f, "runtime_dir = {}", self.runtime_dir)?;
        writeln!(
            f,
            "temp_registration_folder = {}",
            self.temp_registration_folder
        )?;
        writeln!(f, "config_dir = {}", optional(self.config_dir.as_ref()))?;
        writeln!(f, "data_dir = {}", optional(self.data_dir.as_ref()))?;
        writeln!(f, "data_dirs = {}", list(&self.data_dirs))?;
        write!(
            f,
            "kernel_spec_root_paths = {}",
            list(&self.kernel_spec_root_paths)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PathsReport {
        PathsReport {
            os: OsFamily::OtherUnix,
            kernel_spec_root: Some(PathEntry::from("/home/u/.local/share/jupyter/kernels")),
            runtime_dir: PathEntry::from("/run/user/1/jupyter/runtime"),
            temp_registration_folder: PathEntry::from("/tmp/kernelpaths/jupyter/kernels"),
            config_dir: None,
            data_dir: Some(PathEntry::from("/home/u/.local/share/jupyter")),
            data_dirs: vec![
                PathEntry::from("/home/u/.local/share/jupyter"),
                PathEntry::from("/usr/share/jupyter"),
            ],
            kernel_spec_root_paths: Vec::new(),
        }
    }

    #[test]
    fn display_format_is_parseable() {
        let output = sample().to_string();
        assert!(output.contains("os = unix"));
        assert!(output.contains("config_dir = <none>"));
        assert!(output.contains("data_dirs = /home/u/.local/share/jupyter, /usr/share/jupyter"));
        assert!(output.ends_with("kernel_spec_root_paths = "));
    }

    #[test]
    fn json_uses_plain_strings() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["os"], "other_unix");
        assert_eq!(json["runtime_dir"], "/run/user/1/jupyter/runtime");
        assert!(json["config_dir"].is_null());
    }
}

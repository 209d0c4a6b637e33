//! Per-OS directory conventions as a lookup table.
//!
//! Each [`OsLayout`] is plain data plus a few pure functions of the home
//! directory and an environment snapshot, so every platform's rules can be
//! exercised on any host. Nothing here touches the filesystem; real-path
//! resolution is applied by the resolver when `real_path_required` is set.
//!
//! Conventions follow
//! <https://docs.jupyter.org/en/latest/use/jupyter-directories.html>.

use std::path::{Path, PathBuf};

use crate::domain::{EnvVars, OsFamily, env_value};

/// Directory rules for one OS family.
#[derive(Debug)]
pub struct OsLayout {
    pub family: OsFamily,
    /// Writable kernelspec directory, relative to the home directory.
    pub kernels_subpath: &'static [&'static str],
    /// Naively joined paths may not be readable; resolve them before use.
    pub real_path_required: bool,
    /// Whether the writable kernelspec root is listed first among the
    /// system kernelspec roots.
    pub search_includes_writable_root: bool,
    runtime_dir: fn(&Path, &EnvVars) -> PathBuf,
    data_dir: fn(&Path, &EnvVars) -> PathBuf,
    system_data_dirs: fn(&EnvVars) -> Vec<PathBuf>,
    system_kernel_dirs: fn(Option<&Path>, &EnvVars) -> Vec<PathBuf>,
}

const WINDOWS_KERNELS: &[&str] = &["AppData", "Roaming", "jupyter", "kernels"];
const MACOS_KERNELS: &[&str] = &["Library", "Jupyter", "kernels"];
const UNIX_KERNELS: &[&str] = &[".local", "share", "jupyter", "kernels"];

/// Shared system locations on every non-Windows platform, in precedence order.
const UNIX_SYSTEM_DATA_DIRS: &[&str] = &["/usr/local/share/jupyter", "/usr/share/jupyter"];

static WINDOWS: OsLayout = OsLayout {
    family: OsFamily::Windows,
    kernels_subpath: WINDOWS_KERNELS,
    real_path_required: true,
    search_includes_writable_root: true,
    runtime_dir: |home, _| join_all(home, &["AppData", "Roaming", "jupyter", "runtime"]),
    data_dir: windows_data_dir,
    system_data_dirs: |env| program_data(env).map(|p| p.join("jupyter")).into_iter().collect(),
    system_kernel_dirs: |_, env| {
        program_data(env)
            .map(|p| join_all(&p, &["jupyter", "kernels"]))
            .into_iter()
            .collect()
    },
};

static MACOS: OsLayout = OsLayout {
    family: OsFamily::MacOs,
    kernels_subpath: MACOS_KERNELS,
    real_path_required: false,
    search_includes_writable_root: false,
    runtime_dir: |home, _| join_all(home, &["Library", "Jupyter", "runtime"]),
    data_dir: |home, _| join_all(home, &["Library", "Jupyter"]),
    system_data_dirs: |_| unix_system_data_dirs(),
    system_kernel_dirs: |home, _| unix_system_kernel_dirs(home, MACOS_KERNELS),
};

static OTHER_UNIX: OsLayout = OsLayout {
    family: OsFamily::OtherUnix,
    kernels_subpath: UNIX_KERNELS,
    real_path_required: false,
    search_includes_writable_root: false,
    runtime_dir: |home, env| match env_value(env, "XDG_RUNTIME_DIR") {
        Some(xdg) => join_all(Path::new(xdg), &["jupyter", "runtime"]),
        None => join_all(home, &[".local", "share", "jupyter", "runtime"]),
    },
    data_dir: |home, env| {
        let data_home = env_value(env, "XDG_DATA_HOME")
            .map_or_else(|| join_all(home, &[".local", "share"]), PathBuf::from);
        data_home.join("jupyter")
    },
    system_data_dirs: |_| unix_system_data_dirs(),
    system_kernel_dirs: |home, _| unix_system_kernel_dirs(home, UNIX_KERNELS),
};

/// The layout table entry for an OS family.
pub const fn layout_for(family: OsFamily) -> &'static OsLayout {
    match family {
        OsFamily::Windows => &WINDOWS,
        OsFamily::MacOs => &MACOS,
        OsFamily::OtherUnix => &OTHER_UNIX,
    }
}

impl OsLayout {
    /// The writable kernelspec directory under `home`, before real-path resolution.
    pub fn kernel_spec_root(&self, home: &Path) -> PathBuf {
        join_all(home, self.kernels_subpath)
    }

    /// OS default runtime directory (ignores `JUPYTER_RUNTIME_DIR`).
    pub fn runtime_dir(&self, home: &Path, env: &EnvVars) -> PathBuf {
        (self.runtime_dir)(home, env)
    }

    /// OS default user data directory (ignores `JUPYTER_DATA_DIR`).
    pub fn data_dir(&self, home: &Path, env: &EnvVars) -> PathBuf {
        (self.data_dir)(home, env)
    }

    pub fn system_data_dirs(&self, env: &EnvVars) -> Vec<PathBuf> {
        (self.system_data_dirs)(env)
    }

    /// System kernelspec roots, excluding the writable root.
    pub fn system_kernel_dirs(&self, home: Option<&Path>, env: &EnvVars) -> Vec<PathBuf> {
        (self.system_kernel_dirs)(home, env)
    }
}

/// `JUPYTER_CONFIG_DIR`, else `<home>/.jupyter`.
pub fn config_dir(home: Option<&Path>, env: &EnvVars) -> Option<PathBuf> {
    env_value(env, "JUPYTER_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| home.map(|home| home.join(".jupyter")))
}

fn windows_data_dir(home: &Path, env: &EnvVars) -> PathBuf {
    if let Some(app_data) = env_value(env, "APPDATA") {
        return Path::new(app_data).join("jupyter");
    }
    config_dir(Some(home), env).map_or_else(
        || join_all(home, &["Library", "Jupyter"]),
        |config| config.join("data"),
    )
}

fn program_data(env: &EnvVars) -> Option<PathBuf> {
    env_value(env, "PROGRAMDATA").map(PathBuf::from)
}

fn unix_system_data_dirs() -> Vec<PathBuf> {
    UNIX_SYSTEM_DATA_DIRS.iter().map(PathBuf::from).collect()
}

fn unix_system_kernel_dirs(home: Option<&Path>, kernels_subpath: &[&str]) -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/jupyter/kernels"),
        PathBuf::from("/usr/local/share/jupyter/kernels"),
    ];
    if let Some(home) = home {
        dirs.push(join_all(home, kernels_subpath));
    }
    dirs
}

fn join_all(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |acc, part| acc.join(part))
}

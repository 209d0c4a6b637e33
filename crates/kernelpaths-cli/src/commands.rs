//! Subcommand definitions.

use clap::Subcommand;

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show every resolved location in `key = value` format
    Paths,

    /// List data directories in precedence order
    DataDirs {
        /// File or directory the query is made on behalf of
        #[arg(long)]
        resource: Option<String>,
    },

    /// Show variables loaded from the `.env` files
    Env,

    /// List kernelspec search roots in precedence order
    KernelRoots,

    /// List the real-path resolved JUPYTER_PATH entries
    JupyterPaths {
        /// Show the `kernels` subdirectory of each entry instead
        #[arg(long)]
        kernels: bool,
    },

    /// Show the directory used for kernel connection files
    RuntimeDir,

    /// Show the user's writable kernelspec directory
    RootPath,

    /// Show the folder used for temporary kernelspec registrations
    TempFolder,
}

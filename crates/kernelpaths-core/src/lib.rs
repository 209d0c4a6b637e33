//! Kernel search-path resolution and caching.
//!
//! Determines, for any OS, the ordered and deduplicated locations where
//! Jupyter kernelspecs, runtime connection files and data files live, and
//! caches them under concurrent, cancellable and environment-driven
//! invalidation. All host access goes through the traits in [`ports`].
#![deny(unused_crate_dependencies)]

pub mod cache;
pub mod config;
pub mod domain;
pub mod events;
pub mod paths;
pub mod ports;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use cache::MemoizedAsyncCache;
pub use config::{
    ConfigError, DEFAULT_INTERPRETER_TIMEOUT_SECS, DEFAULT_ROOT_PATHS_TTL_SECS, KernelPathsConfig,
    PROBE_SCRIPT_NAME, validate_config,
};
pub use domain::{EnvVars, InterpreterInfo, OsFamily, PathEntry, SearchContext, env_value};
pub use events::{EnvironmentEvent, EnvironmentEventBroadcaster};
pub use paths::{
    DataDirAggregator, DirectoryResolver, PathError, PathsReport, data_root, layout_for,
    prefers_env_path, temp_root,
};
pub use ports::{
    DurableStore, EnvironmentProvider, EnvironmentScope, ExecOutput, ExecRequest, FileSystemPort,
    InterpreterExecutor, PlatformInfo, PortError, SearchPathPorts,
};
pub use services::{KernelSearchPathService, ServiceOptions};

#[cfg(test)]
use tokio_test as _;

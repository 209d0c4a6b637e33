//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the search-path engine expects from the
//! host. They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `tokio::fs`/`std::process` types in any signature
//! - Absence is expressed with `Option`, failure with [`PortError`]
//! - Traits stay minimal; adapters live in `kernelpaths-runtime`

pub mod durable_store;
pub mod environment;
pub mod filesystem;
pub mod interpreter;
pub mod platform;

use std::sync::Arc;

use thiserror::Error;

pub use durable_store::DurableStore;
pub use environment::{EnvironmentProvider, EnvironmentScope};
pub use filesystem::FileSystemPort;
pub use interpreter::{ExecOutput, ExecRequest, InterpreterExecutor};
pub use platform::PlatformInfo;

/// Container for all port trait objects the service needs.
///
/// Lets adapters be wired in one place (the composition root) without the
/// service depending on concrete implementations.
#[derive(Clone)]
pub struct SearchPathPorts {
    pub platform: Arc<dyn PlatformInfo>,
    pub environment: Arc<dyn EnvironmentProvider>,
    pub filesystem: Arc<dyn FileSystemPort>,
    pub executor: Arc<dyn InterpreterExecutor>,
    pub store: Arc<dyn DurableStore>,
}

impl SearchPathPorts {
    pub fn new(
        platform: Arc<dyn PlatformInfo>,
        environment: Arc<dyn EnvironmentProvider>,
        filesystem: Arc<dyn FileSystemPort>,
        executor: Arc<dyn InterpreterExecutor>,
        store: Arc<dyn DurableStore>,
    ) -> Self {
        Self {
            platform,
            environment,
            filesystem,
            executor,
            store,
        }
    }
}

/// Errors reported by port implementations.
///
/// Variants carry rendered messages so the error is `Clone` and can be
/// shared between callers awaiting the same cached computation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    /// Environment variables could not be read.
    #[error("Environment error: {0}")]
    Environment(String),

    /// The interpreter could not be run or exited unsuccessfully.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// The interpreter did not finish in time.
    #[error("Execution timed out after {0}s")]
    Timeout(u64),

    /// The durable store could not be read or written.
    #[error("Store error: {0}")]
    Store(String),
}

impl PortError {
    pub fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

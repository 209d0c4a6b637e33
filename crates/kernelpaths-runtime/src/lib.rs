//! Host adapters for the kernelpaths ports.
//!
//! Everything that touches the real machine lives here: the platform query,
//! the filesystem, the process environment and `.env` files, Python child
//! processes and the JSON state file.
#![deny(unsafe_code)]

mod environment;
mod executor;
mod filesystem;
mod platform;
mod probe_script;
mod store;

pub use environment::ProcessEnvironmentProvider;
pub use executor::PythonExecutor;
pub use filesystem::TokioFileSystem;
pub use platform::HostPlatform;
pub use probe_script::{PROBE_SCRIPT_SOURCE, ensure_probe_script};
pub use store::JsonFileStore;

//! Jupyter directory resolution.
//!
//! This module provides the canonical lookups for every Jupyter location:
//! - Writable kernelspec root and runtime directory
//! - User data and config directories
//! - System data and kernelspec directories
//! - `JUPYTER_PATH` entries and the merged data-dir list
//!
//! # Design
//!
//! - OS conventions live in one table (`layout`), selected by [`OsFamily`](crate::domain::OsFamily)
//! - All I/O goes through the ports, so every OS is testable on any host
//! - Lookups return `Option`/`Vec`; absence is not an error

mod aggregator;
mod ensure;
mod error;
mod jupyter_path;
mod layout;
mod platform;
mod report;
mod resolver;

// Error type
pub use error::PathError;

// OS layout table
pub use layout::{OsLayout, config_dir, layout_for};

// Application roots
pub use platform::{data_root, temp_root};

// Directory operations
pub use ensure::{ensure_directory, verify_writable};

// Lookups and aggregation
pub use aggregator::{DataDirAggregator, DataDirSources, prefers_env_path};
pub use jupyter_path::{jupyter_path_entries, split_jupyter_path};
pub use resolver::DirectoryResolver;

// Introspection
pub use report::PathsReport;

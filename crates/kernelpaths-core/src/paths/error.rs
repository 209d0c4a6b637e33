//! Path-related error types.
//!
//! Public search-path queries never fail; these errors surface from the
//! configuration helpers and are logged where a source is skipped.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution and directory operations.
#[derive(Debug, Clone, Error)]
pub enum PathError {
    /// Could not determine the local data directory for application state.
    #[error("Cannot determine local data directory")]
    NoDataDir,

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// A directory is not writable.
    #[error("Directory {path} is not writable: {reason}")]
    NotWritable { path: PathBuf, reason: String },
}

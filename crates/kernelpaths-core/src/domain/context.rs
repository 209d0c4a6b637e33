//! Query context types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A Python interpreter whose environment contributes data directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterInfo {
    /// Stable identity, used as the data-dir cache key.
    pub id: String,
    /// Path to the interpreter executable.
    pub executable: PathBuf,
    /// `sys.prefix` of the environment, when already known.
    pub sys_prefix: Option<PathBuf>,
}

impl InterpreterInfo {
    /// Describe an interpreter by its executable; the id is the executable path.
    pub fn from_executable(executable: impl Into<PathBuf>) -> Self {
        let executable = executable.into();
        Self {
            id: executable.to_string_lossy().into_owned(),
            executable,
            sys_prefix: None,
        }
    }

    #[must_use]
    pub fn with_sys_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.sys_prefix = Some(prefix.into());
        self
    }
}

/// Selects which data-dir cache record a query uses.
///
/// The resource is forwarded to the interpreter executor and plays no part
/// in the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchContext {
    pub resource: Option<String>,
    pub interpreter: Option<InterpreterInfo>,
}

impl SearchContext {
    pub fn for_interpreter(interpreter: InterpreterInfo) -> Self {
        Self {
            resource: None,
            interpreter: Some(interpreter),
        }
    }

    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Cache key for data-dir aggregation; the empty string stands for
    /// "no interpreter".
    pub fn cache_key(&self) -> String {
        self.interpreter
            .as_ref()
            .map_or_else(String::new, |interpreter| interpreter.id.clone())
    }
}

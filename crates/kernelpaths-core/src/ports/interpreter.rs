//! Interpreter executor port.
//!
//! Runs a fixed probe script inside an interpreter's environment. Every
//! failure is recoverable from the engine's point of view.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PortError;
use crate::domain::InterpreterInfo;

/// A script invocation inside an interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub interpreter: InterpreterInfo,
    /// Scope the interpreter environment is activated for.
    pub resource: Option<String>,
    pub script: PathBuf,
    pub args: Vec<String>,
}

/// Captured output of an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes scripts inside an interpreter's (activated) environment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InterpreterExecutor: Send + Sync {
    async fn execute(&self, request: &ExecRequest) -> Result<ExecOutput, PortError>;

    /// The interpreter's `sys.prefix`.
    ///
    /// The default only reports what the caller already knows; executors that
    /// can ask the interpreter override this.
    async fn sys_prefix(&self, interpreter: &InterpreterInfo) -> Option<PathBuf> {
        interpreter.sys_prefix.clone()
    }
}

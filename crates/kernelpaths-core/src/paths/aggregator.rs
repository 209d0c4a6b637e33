//! Data-directory aggregation.
//!
//! Merges the four documented sources, in precedence order:
//!
//! 1. `JUPYTER_PATH` entries
//! 2. the interpreter's user-site data dir (from the probe script)
//! 3. the environment-prefix data dir and the user data dir, ordered by
//!    `JUPYTER_PREFER_ENV_PATH`
//! 4. the system data dirs
//!
//! The first occurrence of an entry wins and keeps its position. A source
//! that fails contributes nothing.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, error, instrument};

use super::resolver::DirectoryResolver;
use crate::domain::{EnvVars, InterpreterInfo, PathEntry, env_value};
use crate::ports::{ExecRequest, FileSystemPort, InterpreterExecutor};

/// Values of `JUPYTER_PREFER_ENV_PATH` that mean "not set".
const FALSY_VALUES: &[&str] = &["no", "n", "false", "off", "0", "0.0"];

/// Whether environment-level directories take priority over user-level ones.
///
/// An unset variable counts as `"no"`; comparison is case-insensitive.
pub fn prefers_env_path(value: Option<&str>) -> bool {
    let value = value.unwrap_or("no").to_lowercase();
    !FALSY_VALUES.contains(&value.as_str())
}

/// The individual contributions to a data-dir list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataDirSources {
    pub jupyter_paths: Vec<PathEntry>,
    pub interpreter_site: Option<PathEntry>,
    pub env_prefix: Option<PathEntry>,
    pub user: Option<PathEntry>,
    pub system: Vec<PathEntry>,
    pub prefer_env: bool,
}

impl DataDirSources {
    /// Concatenate the sources in precedence order, keeping first occurrences.
    pub fn merge(&self) -> Vec<PathEntry> {
        let (first, second) = if self.prefer_env {
            (&self.env_prefix, &self.user)
        } else {
            (&self.user, &self.env_prefix)
        };

        let merged: IndexSet<&PathEntry> = self
            .jupyter_paths
            .iter()
            .chain(self.interpreter_site.as_ref())
            .chain(first.as_ref())
            .chain(second.as_ref())
            .chain(self.system.iter())
            .collect();
        merged.into_iter().cloned().collect()
    }
}

/// Gathers and merges data-dir sources.
#[derive(Clone)]
pub struct DataDirAggregator {
    resolver: DirectoryResolver,
    executor: Arc<dyn InterpreterExecutor>,
    filesystem: Arc<dyn FileSystemPort>,
    probe_script: PathBuf,
}

impl DataDirAggregator {
    pub fn new(
        resolver: DirectoryResolver,
        executor: Arc<dyn InterpreterExecutor>,
        filesystem: Arc<dyn FileSystemPort>,
        probe_script: PathBuf,
    ) -> Self {
        Self {
            resolver,
            executor,
            filesystem,
            probe_script,
        }
    }

    /// Build the ordered data-dir list for an optional interpreter.
    ///
    /// `jupyter_paths` are the already resolved `JUPYTER_PATH` entries.
    #[instrument(
        skip(self, jupyter_paths, interpreter, env),
        fields(interpreter = interpreter.map_or("", |i| i.id.as_str()))
    )]
    pub async fn aggregate(
        &self,
        jupyter_paths: Vec<PathEntry>,
        interpreter: Option<&InterpreterInfo>,
        resource: Option<&str>,
        env: &EnvVars,
    ) -> Vec<PathEntry> {
        let (interpreter_site, env_prefix) = match interpreter {
            Some(interpreter) => (
                self.interpreter_site_dir(interpreter, resource).await,
                self.executor
                    .sys_prefix(interpreter)
                    .await
                    .map(|prefix| PathEntry::new(prefix.join("share").join("jupyter"))),
            ),
            None => (None, None),
        };

        let system = self.resolver.system_data_dirs(env);
        let env_prefix = env_prefix.filter(|prefix| !system.contains(prefix));

        let sources = DataDirSources {
            jupyter_paths,
            interpreter_site,
            env_prefix,
            user: self.resolver.data_dir(env),
            system,
            prefer_env: prefers_env_path(env_value(env, "JUPYTER_PREFER_ENV_PATH")),
        };
        let dirs = sources.merge();
        debug!(count = dirs.len(), "Aggregated Jupyter data directories");
        dirs
    }

    /// Run the probe script; its trimmed stdout names the user-site data dir.
    async fn interpreter_site_dir(
        &self,
        interpreter: &InterpreterInfo,
        resource: Option<&str>,
    ) -> Option<PathEntry> {
        let request = ExecRequest {
            interpreter: interpreter.clone(),
            resource: resource.map(str::to_string),
            script: self.probe_script.clone(),
            args: Vec::new(),
        };

        match self.executor.execute(&request).await {
            Ok(output) => {
                let site = output.stdout.trim();
                if site.is_empty() {
                    debug!(
                        interpreter = %interpreter.id,
                        stderr = %output.stderr,
                        "Interpreter reported no user-site data dir"
                    );
                    return None;
                }
                let site = PathEntry::new(site);
                if self.filesystem.exists(site.as_path()).await {
                    Some(site)
                } else {
                    debug!(path = %site, "User-site data dir does not exist");
                    None
                }
            }
            Err(e) => {
                error!(
                    interpreter = %interpreter.id,
                    error = %e,
                    "Failed to query user-site data dir"
                );
                None
            }
        }
    }
}

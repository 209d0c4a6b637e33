//! Environment provider backed by the process environment and `.env` files.
//!
//! Variables resolve as: process environment, overlaid by the general env
//! file, overlaid (for [`EnvironmentScope::RunPythonCode`] only) by the
//! Python env file. Snapshots are cached; [`ProcessEnvironmentProvider::refresh`]
//! re-reads the files and announces changes.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use kernelpaths_core::{
    EnvVars, EnvironmentEvent, EnvironmentEventBroadcaster, EnvironmentProvider, EnvironmentScope,
    MemoizedAsyncCache, PortError,
};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Last contents seen per env file; `None` means the file was absent.
type SeenContents = Mutex<HashMap<PathBuf, Option<String>>>;

#[derive(Debug, Default)]
struct EnvFiles {
    env_file: Option<PathBuf>,
    python_env_file: Option<PathBuf>,
    seen: SeenContents,
}

impl EnvFiles {
    fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.env_file.iter().chain(self.python_env_file.iter())
    }

    /// Replace the comparison baseline, returning the previous one.
    fn record(&self, path: &Path, contents: Option<String>) -> Option<Option<String>> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), contents)
    }

    /// Set the baseline for a file that has none yet; later baselines are
    /// only taken by `refresh`.
    fn record_first(&self, path: &Path, contents: Option<&str>) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_path_buf())
            .or_insert_with(|| contents.map(str::to_string));
    }

    async fn load(&self, path: &Path) -> Result<EnvVars, PortError> {
        let contents = read_optional(path).await?;
        let vars = match &contents {
            Some(contents) => parse_env(contents, path)?,
            None => EnvVars::new(),
        };
        self.record_first(path, contents.as_deref());
        Ok(vars)
    }

    async fn custom_variables(&self, scope: EnvironmentScope) -> Result<EnvVars, PortError> {
        let mut vars = match &self.env_file {
            Some(path) => self.load(path).await?,
            None => EnvVars::new(),
        };
        if scope == EnvironmentScope::RunPythonCode {
            if let Some(path) = &self.python_env_file {
                vars.extend(self.load(path).await?);
            }
        }
        debug!(?scope, count = vars.len(), "Loaded custom environment variables");
        Ok(vars)
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, PortError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PortError::io(path, &e)),
    }
}

fn parse_env(contents: &str, path: &Path) -> Result<EnvVars, PortError> {
    dotenvy::from_read_iter(contents.as_bytes())
        .map(|item| {
            item.map_err(|e| PortError::Environment(format!("{}: {e}", path.display())))
        })
        .collect()
}

/// Process environment merged with optional `.env` files.
pub struct ProcessEnvironmentProvider {
    base: EnvVars,
    files: Arc<EnvFiles>,
    custom: MemoizedAsyncCache<EnvironmentScope, EnvVars, PortError>,
    events: EnvironmentEventBroadcaster,
}

impl ProcessEnvironmentProvider {
    /// A provider over the current process environment and no env files.
    pub fn new() -> Self {
        Self::with_base(std::env::vars().collect())
    }

    /// A provider over an explicit base environment.
    pub fn with_base(base: EnvVars) -> Self {
        Self {
            base,
            files: Arc::new(EnvFiles::default()),
            custom: MemoizedAsyncCache::new(),
            events: EnvironmentEventBroadcaster::new(),
        }
    }

    /// Set the env files. A file that does not exist contributes nothing
    /// until it is created and [`refresh`](Self::refresh) is called.
    #[must_use]
    pub fn with_env_files(
        mut self,
        env_file: Option<PathBuf>,
        python_env_file: Option<PathBuf>,
    ) -> Self {
        self.files = Arc::new(EnvFiles {
            env_file,
            python_env_file,
            seen: SeenContents::default(),
        });
        self
    }

    /// Expire cached snapshots after `ttl`.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.custom = MemoizedAsyncCache::with_ttl(ttl);
        self
    }

    /// Variables contributed by the env files alone.
    pub async fn custom_variables(&self, scope: EnvironmentScope) -> Result<EnvVars, PortError> {
        let files = self.files.clone();
        self.custom
            .get(scope, move || async move { files.custom_variables(scope).await })
            .await
    }

    /// Re-read the env files and announce a change if any file's contents
    /// differ from the last read (creation and deletion included).
    ///
    /// Files never read before are recorded without counting as a change.
    pub async fn refresh(&self) -> Result<bool, PortError> {
        let mut changed = false;
        for path in self.files.paths() {
            let current = read_optional(path).await?;
            if let Some(previous) = self.files.record(path, current.clone()) {
                if previous != current {
                    debug!(path = %path.display(), "Env file changed");
                    changed = true;
                }
            }
        }

        if changed {
            self.custom.invalidate_all();
            info!("Environment variables changed");
            self.events.broadcast(EnvironmentEvent::VariablesChanged);
        }
        Ok(changed)
    }
}

impl Default for ProcessEnvironmentProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnvironmentProvider for ProcessEnvironmentProvider {
    async fn environment_variables(&self, scope: EnvironmentScope) -> Result<EnvVars, PortError> {
        let mut vars = self.base.clone();
        vars.extend(self.custom_variables(scope).await?);
        Ok(vars)
    }

    fn subscribe(&self) -> broadcast::Receiver<EnvironmentEvent> {
        self.events.subscribe()
    }
}

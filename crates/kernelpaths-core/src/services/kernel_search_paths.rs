//! Kernel search-path service.
//!
//! Owns the cache tiers and exposes the public queries:
//!
//! | Tier | Holds | Lifetime | Cleared by |
//! |------|-------|----------|------------|
//! | 1 | writable kernelspec root | process (also persisted) | nothing |
//! | 2 | `JUPYTER_PATH` entries, plain and `/kernels` | until env change | `VariablesChanged` |
//! | 3 | kernelspec root paths | TTL (60 s default) | TTL, cancellation |
//! | - | data dirs per interpreter | process | nothing |
//!
//! None of the public queries fail: absence is `None` or an empty list and
//! source failures are logged.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use indexmap::IndexSet;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::cache::MemoizedAsyncCache;
use crate::config::KernelPathsConfig;
use crate::domain::{EnvVars, PathEntry, SearchContext};
use crate::events::EnvironmentEvent;
use crate::paths::{
    DataDirAggregator, DirectoryResolver, PathsReport, ensure_directory, jupyter_path_entries,
    verify_writable,
};
use crate::ports::{EnvironmentScope, PortError, SearchPathPorts};

/// Durable-store key of the writable kernelspec root.
pub const KERNELSPEC_ROOT_PATH_KEY: &str = "kernelpaths.kernelspec_root_path";

/// Durable-store key of the `JUPYTER_PATH` kernelspec directories.
pub const JUPYTER_KERNEL_PATHS_KEY: &str = "kernelpaths.jupyter_kernel_paths";

/// Which `JUPYTER_PATH` list a tier-2 record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum JupyterPathKind {
    /// The entries themselves (data dirs).
    Plain,
    /// The `kernels` subdirectory of each entry.
    Kernels,
}

impl JupyterPathKind {
    const fn subdir(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Kernels => Some("kernels"),
        }
    }
}

/// Tunables of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Root for the fallback runtime dir and temp kernelspec registrations.
    pub temp_dir: PathBuf,
    /// Script run inside interpreters to find their user-site data dir.
    pub probe_script: PathBuf,
    pub root_paths_ttl: Duration,
}

impl ServiceOptions {
    pub fn from_config(config: &KernelPathsConfig) -> Self {
        Self {
            temp_dir: config.effective_temp_dir(),
            probe_script: config.effective_probe_script(),
            root_paths_ttl: config.root_paths_ttl(),
        }
    }
}

struct Inner {
    ports: SearchPathPorts,
    resolver: DirectoryResolver,
    aggregator: DataDirAggregator,
    options: ServiceOptions,
    root_path: MemoizedAsyncCache<(), Option<PathEntry>, PortError>,
    jupyter_paths: MemoizedAsyncCache<JupyterPathKind, Vec<PathEntry>, PortError>,
    data_dirs: MemoizedAsyncCache<String, Vec<PathEntry>, PortError>,
    root_paths: MemoizedAsyncCache<(), Vec<PathEntry>, PortError>,
    events: Mutex<broadcast::Receiver<EnvironmentEvent>>,
    runtime_dir_verified: AtomicBool,
}

/// Resolves and caches every Jupyter search location.
///
/// Cheap to clone; clones share caches.
#[derive(Clone)]
pub struct KernelSearchPathService {
    inner: Arc<Inner>,
}

impl KernelSearchPathService {
    pub fn new(ports: SearchPathPorts, options: ServiceOptions) -> Self {
        let resolver = DirectoryResolver::new(ports.platform.clone(), ports.filesystem.clone());
        let aggregator = DataDirAggregator::new(
            resolver.clone(),
            ports.executor.clone(),
            ports.filesystem.clone(),
            options.probe_script.clone(),
        );
        let events = Mutex::new(ports.environment.subscribe());
        let root_paths = MemoizedAsyncCache::with_ttl(options.root_paths_ttl);

        Self {
            inner: Arc::new(Inner {
                ports,
                resolver,
                aggregator,
                options,
                root_path: MemoizedAsyncCache::new(),
                jupyter_paths: MemoizedAsyncCache::new(),
                data_dirs: MemoizedAsyncCache::new(),
                root_paths,
                events,
                runtime_dir_verified: AtomicBool::new(false),
            }),
        }
    }

    /// The writable kernelspec directory for the current user.
    ///
    /// A value persisted by an earlier run wins; otherwise the value is
    /// computed once per process and persisted when it changed.
    pub async fn kernel_spec_root_path(&self) -> Option<PathEntry> {
        self.inner.drain_events();
        self.inner.kernel_spec_root_path().await
    }

    /// `<temp>/jupyter/kernels`, created on demand.
    pub async fn kernel_spec_temp_registration_folder(&self) -> PathEntry {
        let dir = PathEntry::new(self.inner.options.temp_dir.join("jupyter").join("kernels"));
        let filesystem = self.inner.ports.filesystem.as_ref();
        if let Err(e) = ensure_directory(filesystem, dir.as_path()).await {
            error!(path = %dir, error = %e, "Failed to create temp kernelspec registration folder");
        }
        dir
    }

    /// A writable directory for kernel connection files.
    ///
    /// Falls back to `<temp>/jupyter/runtime` when the Jupyter runtime
    /// directory cannot be determined, created or written.
    pub async fn runtime_dir(&self) -> PathEntry {
        self.inner.drain_events();
        if let Some(dir) = self.inner.jupyter_runtime_dir().await {
            return dir;
        }

        let fallback = PathEntry::new(self.inner.options.temp_dir.join("jupyter").join("runtime"));
        let filesystem = self.inner.ports.filesystem.as_ref();
        if let Err(e) = ensure_directory(filesystem, fallback.as_path()).await {
            error!(path = %fallback, error = %e, "Failed to create fallback runtime directory");
        }
        trace!(path = %fallback, "Using fallback runtime directory");
        fallback
    }

    /// Ordered, deduplicated data directories for a context.
    ///
    /// Cached per interpreter for the life of the process.
    pub async fn data_dirs(&self, context: &SearchContext) -> Vec<PathEntry> {
        self.inner.drain_events();
        let inner = self.inner.clone();
        let owned = context.clone();
        self.inner
            .data_dirs
            .get(context.cache_key(), move || inner.compute_data_dirs(owned))
            .await
            .unwrap_or_else(|e| {
                warn!(
                    interpreter = %context.cache_key(),
                    error = %e,
                    "Failed to compute data dirs"
                );
                Vec::new()
            })
    }

    /// Ordered, deduplicated kernelspec search roots.
    ///
    /// Cached for the configured TTL. Firing `cancel` discards the record this
    /// call created; a computation that observes the cancellation yields an
    /// empty list.
    pub async fn kernel_spec_root_paths(&self, cancel: &CancellationToken) -> Vec<PathEntry> {
        self.inner.drain_events();
        let inner = self.inner.clone();
        let token = cancel.clone();
        self.inner
            .root_paths
            .get_with_cancellation((), Some(cancel.clone()), move || {
                inner.compute_root_paths(token)
            })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to compute kernelspec root paths");
                Vec::new()
            })
    }

    /// Real-path resolved `JUPYTER_PATH` entries.
    pub async fn jupyter_paths(&self) -> Vec<PathEntry> {
        self.inner.drain_events();
        self.inner
            .cached_jupyter_paths(JupyterPathKind::Plain)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read JUPYTER_PATH");
                Vec::new()
            })
    }

    /// The `kernels` subdirectory of every `JUPYTER_PATH` entry.
    ///
    /// A list persisted by an earlier run is returned while a fresh one is
    /// computed in the background.
    pub async fn jupyter_kernel_paths(&self) -> Vec<PathEntry> {
        self.inner.drain_events();
        self.inner.jupyter_kernel_paths().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read JUPYTER_PATH kernel paths");
            Vec::new()
        })
    }

    /// Drop every cache that depends on environment variables.
    ///
    /// Called automatically when the environment provider announces a
    /// change; the kernelspec root and persisted values are kept.
    pub fn on_environment_changed(&self) {
        self.inner.on_environment_changed();
    }

    /// Resolve every location at once.
    pub async fn report(&self, context: &SearchContext) -> PathsReport {
        let env = self.inner.env().await.unwrap_or_else(|e| {
            warn!(error = %e, "Reporting without environment variables");
            EnvVars::new()
        });
        PathsReport {
            os: self.inner.resolver.os_family(),
            kernel_spec_root: self.kernel_spec_root_path().await,
            runtime_dir: self.runtime_dir().await,
            temp_registration_folder: self.kernel_spec_temp_registration_folder().await,
            config_dir: self.inner.resolver.config_dir(&env),
            data_dir: self.inner.resolver.data_dir(&env),
            data_dirs: self.data_dirs(context).await,
            kernel_spec_root_paths: self.kernel_spec_root_paths(&CancellationToken::new()).await,
        }
    }
}

impl Inner {
    async fn env(&self) -> Result<EnvVars, PortError> {
        self.ports
            .environment
            .environment_variables(EnvironmentScope::RunPythonCode)
            .await
    }

    /// Apply environment events received since the last query.
    fn drain_events(&self) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;
        loop {
            match events.try_recv() {
                Ok(EnvironmentEvent::VariablesChanged) => changed = true,
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Environment events lagged");
                    changed = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        drop(events);
        if changed {
            self.on_environment_changed();
        }
    }

    fn on_environment_changed(&self) {
        debug!("Environment changed; dropping JUPYTER_PATH caches");
        self.jupyter_paths.invalidate_all();
    }

    async fn kernel_spec_root_path(self: &Arc<Self>) -> Option<PathEntry> {
        if let Some(persisted) = self.persisted_root_path() {
            return Some(persisted);
        }
        let inner = self.clone();
        self.root_path
            .get((), move || inner.compute_root_path())
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to resolve kernelspec root");
                None
            })
    }

    fn persisted_root_path(&self) -> Option<PathEntry> {
        self.ports
            .store
            .get::<Option<String>>(KERNELSPEC_ROOT_PATH_KEY, None)
            .filter(|path| !path.is_empty())
            .map(PathEntry::new)
    }

    async fn compute_root_path(self: Arc<Self>) -> Result<Option<PathEntry>, PortError> {
        let root = self.resolver.kernel_spec_root_path().await;
        trace!(root = ?root, "Resolved kernelspec root path");

        let current = self
            .ports
            .store
            .get::<Option<String>>(KERNELSPEC_ROOT_PATH_KEY, None);
        let updated = root.as_ref().map(PathEntry::to_string_lossy);
        if current != updated {
            if let Err(e) = self.ports.store.set(KERNELSPEC_ROOT_PATH_KEY, &updated).await {
                warn!(error = %e, "Failed to persist kernelspec root path");
            }
        }
        Ok(root)
    }

    async fn jupyter_runtime_dir(&self) -> Option<PathEntry> {
        let env = self.env().await.unwrap_or_else(|e| {
            warn!(error = %e, "Resolving runtime dir without environment variables");
            EnvVars::new()
        });
        let Some(dir) = self.resolver.runtime_dir(&env).await else {
            error!("Failed to determine Jupyter runtime directory");
            return None;
        };

        let filesystem = self.ports.filesystem.as_ref();
        let checked = async {
            ensure_directory(filesystem, dir.as_path()).await?;
            if !self.runtime_dir_verified.load(Ordering::Acquire) {
                verify_writable(filesystem, dir.as_path()).await?;
                self.runtime_dir_verified.store(true, Ordering::Release);
            }
            Ok::<_, crate::paths::PathError>(())
        };
        match checked.await {
            Ok(()) => Some(dir),
            Err(e) => {
                error!(path = %dir, error = %e, "Runtime directory is not usable");
                None
            }
        }
    }

    async fn cached_jupyter_paths(
        self: &Arc<Self>,
        kind: JupyterPathKind,
    ) -> Result<Vec<PathEntry>, PortError> {
        let inner = self.clone();
        self.jupyter_paths
            .get(kind, move || inner.compute_jupyter_paths(kind))
            .await
    }

    async fn compute_jupyter_paths(
        self: Arc<Self>,
        kind: JupyterPathKind,
    ) -> Result<Vec<PathEntry>, PortError> {
        let env = self.env().await?;
        let paths = jupyter_path_entries(
            &env,
            self.resolver.os_family(),
            kind.subdir(),
            self.ports.filesystem.as_ref(),
        )
        .await;
        if kind == JupyterPathKind::Kernels && !paths.is_empty() {
            self.persist_kernel_paths(&paths).await;
        }
        Ok(paths)
    }

    async fn persist_kernel_paths(&self, paths: &[PathEntry]) {
        let current: Vec<PathEntry> = self.ports.store.get(JUPYTER_KERNEL_PATHS_KEY, Vec::new());
        if current == paths {
            return;
        }
        if let Err(e) = self.ports.store.set(JUPYTER_KERNEL_PATHS_KEY, &paths).await {
            warn!(error = %e, "Failed to persist JUPYTER_PATH kernel paths");
        }
    }

    async fn jupyter_kernel_paths(self: &Arc<Self>) -> Result<Vec<PathEntry>, PortError> {
        if let Some(paths) = self.jupyter_paths.peek(&JupyterPathKind::Kernels) {
            return Ok(paths);
        }

        let persisted: Vec<PathEntry> = self.ports.store.get(JUPYTER_KERNEL_PATHS_KEY, Vec::new());
        if persisted.is_empty() {
            return self.cached_jupyter_paths(JupyterPathKind::Kernels).await;
        }

        let inner = self.clone();
        tokio::spawn(async move {
            if let Err(e) = inner.cached_jupyter_paths(JupyterPathKind::Kernels).await {
                warn!(error = %e, "Background JUPYTER_PATH refresh failed");
            }
        });
        trace!(count = persisted.len(), "Using persisted JUPYTER_PATH kernel paths");
        Ok(persisted)
    }

    async fn compute_data_dirs(
        self: Arc<Self>,
        context: SearchContext,
    ) -> Result<Vec<PathEntry>, PortError> {
        let env = self.env().await?;
        let jupyter_paths = self
            .cached_jupyter_paths(JupyterPathKind::Plain)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Skipping JUPYTER_PATH data dirs");
                Vec::new()
            });
        Ok(self
            .aggregator
            .aggregate(
                jupyter_paths,
                context.interpreter.as_ref(),
                context.resource.as_deref(),
                &env,
            )
            .await)
    }

    async fn compute_root_paths(
        self: Arc<Self>,
        cancel: CancellationToken,
    ) -> Result<Vec<PathEntry>, PortError> {
        let kernel_paths = self.jupyter_kernel_paths().await.unwrap_or_else(|e| {
            warn!(error = %e, "Skipping JUPYTER_PATH kernel paths");
            Vec::new()
        });
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        let env = self.env().await?;
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        let mut paths: IndexSet<PathEntry> = kernel_paths.into_iter().collect();
        if self.resolver.search_includes_writable_root() {
            let root = self.kernel_spec_root_path().await;
            if cancel.is_cancelled() {
                return Ok(Vec::new());
            }
            paths.extend(root);
        }
        paths.extend(self.resolver.system_kernel_spec_dirs(&env));

        let paths: Vec<PathEntry> = paths.into_iter().collect();
        debug!(
            paths = %paths.iter().map(PathEntry::to_string_lossy).collect::<Vec<_>>().join(", "),
            "Kernelspec root paths"
        );
        Ok(paths)
    }
}

//! In-memory port implementations for tests.
//!
//! Available to this crate's unit tests and, through the `test-utils`
//! feature, to integration tests of dependent crates.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::domain::{EnvVars, InterpreterInfo, OsFamily, PathEntry};
use crate::events::{EnvironmentEvent, EnvironmentEventBroadcaster};
use crate::ports::{
    DurableStore, EnvironmentProvider, EnvironmentScope, ExecOutput, ExecRequest, FileSystemPort,
    InterpreterExecutor, PlatformInfo, PortError, SearchPathPorts,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key(path: &Path) -> PathBuf {
    PathEntry::new(path).into_path_buf()
}

/// Fixed platform facts.
#[derive(Debug, Clone)]
pub struct FakePlatform {
    home: Option<PathBuf>,
    os: OsFamily,
}

impl FakePlatform {
    pub fn new(os: OsFamily, home: Option<&str>) -> Self {
        Self {
            home: home.map(PathBuf::from),
            os,
        }
    }

    pub fn linux(home: &str) -> Self {
        Self::new(OsFamily::OtherUnix, Some(home))
    }

    pub fn macos(home: &str) -> Self {
        Self::new(OsFamily::MacOs, Some(home))
    }

    pub fn windows(home: &str) -> Self {
        Self::new(OsFamily::Windows, Some(home))
    }

    pub fn homeless(os: OsFamily) -> Self {
        Self::new(os, None)
    }
}

impl PlatformInfo for FakePlatform {
    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn os_family(&self) -> OsFamily {
        self.os
    }
}

#[derive(Debug, Default)]
struct FsState {
    dirs: HashSet<PathBuf>,
    files: HashMap<PathBuf, Vec<u8>>,
    read_only: HashSet<PathBuf>,
    aliases: HashMap<PathBuf, PathBuf>,
}

/// An in-memory filesystem. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeFileSystem {
    state: Arc<Mutex<FsState>>,
    creates: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl FakeFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a directory (and its ancestors) exist.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = lock(&self.state);
        for ancestor in key(path.as_ref()).ancestors() {
            state.dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Refuse writes and directory creation at or below `path`.
    pub fn set_read_only(&self, path: impl AsRef<Path>) {
        lock(&self.state).read_only.insert(key(path.as_ref()));
    }

    /// Make `path` resolve to `target` through [`FileSystemPort::real_path`].
    pub fn add_alias(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let target = key(target.as_ref());
        self.add_dir(&target);
        lock(&self.state).aliases.insert(key(path.as_ref()), target);
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        lock(&self.state).dirs.contains(&key(path.as_ref()))
    }

    /// Files currently present.
    pub fn files(&self) -> Vec<PathBuf> {
        lock(&self.state).files.keys().cloned().collect()
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn is_read_only(state: &FsState, path: &Path) -> bool {
        path.ancestors().any(|a| state.read_only.contains(a))
    }
}

#[async_trait]
impl FileSystemPort for FakeFileSystem {
    async fn create_directory(&self, path: &Path) -> Result<(), PortError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let path = key(path);
        let mut state = lock(&self.state);
        if state.dirs.contains(&path) {
            return Ok(());
        }
        if Self::is_read_only(&state, &path) {
            return Err(PortError::Io {
                path: path.display().to_string(),
                reason: "permission denied".to_string(),
            });
        }
        for ancestor in path.ancestors() {
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        let path = key(path);
        let state = lock(&self.state);
        state.dirs.contains(&path) || state.files.contains_key(&path)
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), PortError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let path = key(path);
        let mut state = lock(&self.state);
        if Self::is_read_only(&state, &path) {
            return Err(PortError::Io {
                path: path.display().to_string(),
                reason: "permission denied".to_string(),
            });
        }
        state.files.insert(path, contents.to_vec());
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<(), PortError> {
        let path = key(path);
        match lock(&self.state).files.remove(&path) {
            Some(_) => Ok(()),
            None => Err(PortError::Io {
                path: path.display().to_string(),
                reason: "not found".to_string(),
            }),
        }
    }

    async fn real_path(&self, path: &Path) -> Option<PathEntry> {
        let path = key(path);
        let state = lock(&self.state);
        if let Some(target) = state.aliases.get(&path) {
            return Some(PathEntry::new(target));
        }
        let exists = state.dirs.contains(&path) || state.files.contains_key(&path);
        exists.then(|| PathEntry::new(path))
    }
}

/// A mutable environment that counts reads and announces changes.
#[derive(Debug, Clone, Default)]
pub struct FakeEnvironment {
    vars: Arc<Mutex<EnvVars>>,
    reads: Arc<AtomicUsize>,
    delay: Arc<Mutex<Option<Duration>>>,
    events: EnvironmentEventBroadcaster,
}

impl FakeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(pairs: &[(&str, &str)]) -> Self {
        let env = Self::new();
        for (name, value) in pairs {
            env.set_quietly(name, value);
        }
        env
    }

    /// Change a variable and broadcast `VariablesChanged`.
    pub fn set(&self, name: &str, value: &str) {
        self.set_quietly(name, value);
        self.events.broadcast(EnvironmentEvent::VariablesChanged);
    }

    /// Change a variable without telling anyone.
    pub fn set_quietly(&self, name: &str, value: &str) {
        lock(&self.vars).insert(name.to_string(), value.to_string());
    }

    /// Make every later read take `delay`.
    pub fn set_read_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnvironmentProvider for FakeEnvironment {
    async fn environment_variables(&self, _scope: EnvironmentScope) -> Result<EnvVars, PortError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(lock(&self.vars).clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<EnvironmentEvent> {
        self.events.subscribe()
    }
}

/// A durable store held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write.
    pub fn insert(&self, key: &str, value: Value) {
        lock(&self.values).insert(key.to_string(), value);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    fn get_value(&self, key: &str) -> Option<Value> {
        lock(&self.values).get(key).cloned()
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<(), PortError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut values = lock(&self.values);
        if value.is_null() {
            values.remove(key);
        } else {
            values.insert(key.to_string(), value);
        }
        Ok(())
    }
}

/// An executor that answers every request with a fixed output and records
/// the requests it saw.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    stdout: String,
    sys_prefix: Option<PathBuf>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ExecRequest>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    #[must_use]
    pub fn with_sys_prefix(mut self, prefix: &str) -> Self {
        self.sys_prefix = Some(PathBuf::from(prefix));
        self
    }

    /// Sleep this long (on the tokio clock) before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<ExecRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl InterpreterExecutor for RecordingExecutor {
    async fn execute(&self, request: &ExecRequest) -> Result<ExecOutput, PortError> {
        lock(&self.requests).push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(ExecOutput {
            stdout: self.stdout.clone(),
            stderr: String::new(),
        })
    }

    async fn sys_prefix(&self, interpreter: &InterpreterInfo) -> Option<PathBuf> {
        interpreter.sys_prefix.clone().or_else(|| self.sys_prefix.clone())
    }
}

/// Handles to every fake behind a [`SearchPathPorts`].
#[derive(Debug, Clone)]
pub struct FakePorts {
    pub platform: FakePlatform,
    pub environment: FakeEnvironment,
    pub filesystem: FakeFileSystem,
    pub executor: RecordingExecutor,
    pub store: MemoryStore,
}

impl FakePorts {
    /// Linux host with home `/home/u`, an empty environment and filesystem.
    pub fn linux() -> Self {
        Self::new(FakePlatform::linux("/home/u"))
    }

    pub fn new(platform: FakePlatform) -> Self {
        Self {
            platform,
            environment: FakeEnvironment::new(),
            filesystem: FakeFileSystem::new(),
            executor: RecordingExecutor::new(),
            store: MemoryStore::new(),
        }
    }

    #[must_use]
    pub fn with_executor(mut self, executor: RecordingExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn ports(&self) -> SearchPathPorts {
        SearchPathPorts::new(
            Arc::new(self.platform.clone()),
            Arc::new(self.environment.clone()),
            Arc::new(self.filesystem.clone()),
            Arc::new(self.executor.clone()),
            Arc::new(self.store.clone()),
        )
    }
}

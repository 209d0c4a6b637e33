//! End-to-end scenarios: the search-path service over real adapters in a
//! temporary directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kernelpaths_core::testing::{FakePlatform, RecordingExecutor};
use kernelpaths_core::{
    EnvVars, EnvironmentProvider, EnvironmentScope, KernelSearchPathService, PathEntry,
    SearchContext, SearchPathPorts, ServiceOptions,
};
use kernelpaths_runtime::{
    JsonFileStore, ProcessEnvironmentProvider, TokioFileSystem, ensure_probe_script,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let sandbox = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(sandbox.home()).unwrap();
        sandbox
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn home(&self) -> PathBuf {
        self.path("home")
    }

    fn options(&self) -> ServiceOptions {
        ServiceOptions {
            temp_dir: self.path("tmp"),
            probe_script: self.path("tmp/print_jupyter_data_dir.py"),
            root_paths_ttl: Duration::from_secs(60),
        }
    }

    async fn service(
        &self,
        environment: Arc<ProcessEnvironmentProvider>,
    ) -> KernelSearchPathService {
        let store = JsonFileStore::open(self.path("state/state.json")).await.unwrap();
        let ports = SearchPathPorts::new(
            Arc::new(FakePlatform::linux(self.home().to_str().unwrap())),
            environment,
            Arc::new(TokioFileSystem::new()),
            Arc::new(RecordingExecutor::new()),
            Arc::new(store),
        );
        KernelSearchPathService::new(ports, self.options())
    }

    fn environment(&self, pairs: &[(&str, &Path)]) -> Arc<ProcessEnvironmentProvider> {
        let base: EnvVars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.to_string_lossy().into_owned()))
            .collect();
        Arc::new(
            ProcessEnvironmentProvider::with_base(base)
                .with_env_files(Some(self.path("workspace/.env")), None),
        )
    }
}

#[tokio::test]
async fn runtime_dir_is_created_under_xdg_runtime_dir() {
    let sandbox = Sandbox::new();
    let xdg = sandbox.path("xdg");
    let service = sandbox
        .service(sandbox.environment(&[("XDG_RUNTIME_DIR", &xdg)]))
        .await;

    let dir = service.runtime_dir().await;
    assert_eq!(dir, PathEntry::new(xdg.join("jupyter").join("runtime")));
    assert!(dir.as_path().is_dir());
    assert_eq!(fs::read_dir(dir.as_path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unusable_runtime_dir_falls_back_to_temp() {
    let sandbox = Sandbox::new();
    let blocker = sandbox.path("not-a-dir");
    fs::write(&blocker, "file").unwrap();
    let service = sandbox
        .service(sandbox.environment(&[("JUPYTER_RUNTIME_DIR", &blocker.join("runtime"))]))
        .await;

    let dir = service.runtime_dir().await;
    assert_eq!(dir, PathEntry::new(sandbox.path("tmp/jupyter/runtime")));
    assert!(dir.as_path().is_dir());
}

#[tokio::test]
async fn kernelspec_root_survives_restart() {
    let sandbox = Sandbox::new();
    let expected = PathEntry::new(sandbox.home().join(".local/share/jupyter/kernels"));

    let first = sandbox.service(sandbox.environment(&[])).await;
    assert_eq!(first.kernel_spec_root_path().await, Some(expected.clone()));

    let state = fs::read_to_string(sandbox.path("state/state.json")).unwrap();
    assert!(state.contains("kernelspec_root_path"));

    let second = sandbox.service(sandbox.environment(&[])).await;
    assert_eq!(second.kernel_spec_root_path().await, Some(expected));
}

#[tokio::test]
async fn env_file_change_reaches_jupyter_paths() {
    let sandbox = Sandbox::new();
    let first = sandbox.path("first");
    let second = sandbox.path("second");
    fs::create_dir_all(first.join("kernels")).unwrap();
    fs::create_dir_all(second.join("kernels")).unwrap();
    fs::create_dir_all(sandbox.path("workspace")).unwrap();
    let env_file = sandbox.path("workspace/.env");
    fs::write(&env_file, format!("JUPYTER_PATH={}\n", first.display())).unwrap();

    let environment = sandbox.environment(&[]);
    let service = sandbox.service(environment.clone()).await;
    let canonical = |p: &Path| PathEntry::new(fs::canonicalize(p).unwrap());

    assert_eq!(service.jupyter_paths().await, vec![canonical(&first)]);

    fs::write(&env_file, format!("JUPYTER_PATH={}\n", second.display())).unwrap();
    assert!(environment.refresh().await.unwrap());
    assert_eq!(service.jupyter_paths().await, vec![canonical(&second)]);

    let roots = service
        .kernel_spec_root_paths(&CancellationToken::new())
        .await;
    assert_eq!(roots.first(), Some(&canonical(&second.join("kernels"))));
}

#[tokio::test]
async fn env_file_change_survives_expired_snapshot() {
    let sandbox = Sandbox::new();
    let first = sandbox.path("first");
    let second = sandbox.path("second");
    fs::create_dir_all(&first).unwrap();
    fs::create_dir_all(&second).unwrap();
    fs::create_dir_all(sandbox.path("workspace")).unwrap();
    let env_file = sandbox.path("workspace/.env");
    fs::write(&env_file, format!("JUPYTER_PATH={}\n", first.display())).unwrap();

    let environment = Arc::new(
        ProcessEnvironmentProvider::with_base(EnvVars::new())
            .with_env_files(Some(env_file.clone()), None)
            .with_cache_ttl(Duration::from_millis(50)),
    );
    let service = sandbox.service(environment.clone()).await;
    let canonical = |p: &Path| PathEntry::new(fs::canonicalize(p).unwrap());

    assert_eq!(service.jupyter_paths().await, vec![canonical(&first)]);

    fs::write(&env_file, format!("JUPYTER_PATH={}\n", second.display())).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    environment
        .environment_variables(EnvironmentScope::RunPythonCode)
        .await
        .unwrap();

    assert!(environment.refresh().await.unwrap());
    assert_eq!(service.jupyter_paths().await, vec![canonical(&second)]);
}

#[tokio::test]
async fn data_dirs_follow_linux_layout() {
    let sandbox = Sandbox::new();
    let service = sandbox.service(sandbox.environment(&[])).await;

    let dirs = service.data_dirs(&SearchContext::default()).await;
    assert_eq!(
        dirs,
        vec![
            PathEntry::new(sandbox.home().join(".local/share/jupyter")),
            PathEntry::from("/usr/local/share/jupyter"),
            PathEntry::from("/usr/share/jupyter"),
        ]
    );
}

#[tokio::test]
async fn probe_script_deploys_to_configured_location() {
    let sandbox = Sandbox::new();
    let script = sandbox.options().probe_script;
    ensure_probe_script(&script).await.unwrap();
    assert!(script.is_file());
}

#[tokio::test]
async fn report_lists_every_location() {
    let sandbox = Sandbox::new();
    let service = sandbox.service(sandbox.environment(&[])).await;

    let report = service.report(&SearchContext::default()).await;
    let text = report.to_string();
    assert!(text.contains("kernel_spec_root = "));
    assert!(text.contains("temp_registration_folder = "));
    assert!(report.temp_registration_folder.as_path().is_dir());
}

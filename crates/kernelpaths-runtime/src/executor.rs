//! Interpreter executor that runs Python as a child process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kernelpaths_core::{
    EnvironmentProvider, EnvironmentScope, ExecOutput, ExecRequest, InterpreterExecutor,
    InterpreterInfo, PortError,
};
use tokio::process::Command;
use tracing::{debug, warn};

const SYS_PREFIX_SNIPPET: &str = "import sys; sys.stdout.write(sys.prefix)";

/// Runs scripts with an interpreter executable, optionally inside the
/// variables of an environment provider.
pub struct PythonExecutor {
    timeout: Duration,
    environment: Option<Arc<dyn EnvironmentProvider>>,
}

impl PythonExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            environment: None,
        }
    }

    /// Run children with the provider's `RunPythonCode` variables instead
    /// of the inherited environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Arc<dyn EnvironmentProvider>) -> Self {
        self.environment = Some(environment);
        self
    }

    async fn run(
        &self,
        executable: &Path,
        args: Vec<OsString>,
        working_dir: Option<&Path>,
    ) -> Result<ExecOutput, PortError> {
        let mut cmd = Command::new(executable);
        cmd.args(&args)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("PYTHONUNBUFFERED", "1");

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        if let Some(environment) = &self.environment {
            match environment
                .environment_variables(EnvironmentScope::RunPythonCode)
                .await
            {
                Ok(vars) => {
                    cmd.env_clear().envs(vars).env("PYTHONUNBUFFERED", "1");
                }
                Err(e) => warn!(error = %e, "Running interpreter with inherited environment"),
            }
        }

        debug!(executable = %executable.display(), ?args, "Running interpreter");
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| PortError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                PortError::Execution(format!("Failed to spawn {}: {e}", executable.display()))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(PortError::Execution(format!(
                "{} exited with {}: {}",
                executable.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(ExecOutput { stdout, stderr })
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_dir())
}

/// Directory a resource lives in, when the resource is an existing path.
async fn resource_dir(resource: Option<&str>) -> Option<PathBuf> {
    let path = Path::new(resource?);
    if is_dir(path).await {
        return Some(path.to_path_buf());
    }
    let parent = path.parent()?;
    is_dir(parent).await.then(|| parent.to_path_buf())
}

#[async_trait]
impl InterpreterExecutor for PythonExecutor {
    async fn execute(&self, request: &ExecRequest) -> Result<ExecOutput, PortError> {
        let mut args = vec![request.script.clone().into_os_string()];
        args.extend(request.args.iter().map(OsString::from));
        let working_dir = resource_dir(request.resource.as_deref()).await;
        self.run(&request.interpreter.executable, args, working_dir.as_deref())
            .await
    }

    async fn sys_prefix(&self, interpreter: &InterpreterInfo) -> Option<PathBuf> {
        if let Some(prefix) = &interpreter.sys_prefix {
            return Some(prefix.clone());
        }
        let args = vec![OsString::from("-c"), OsString::from(SYS_PREFIX_SNIPPET)];
        match self.run(&interpreter.executable, args, None).await {
            Ok(output) => {
                let prefix = output.stdout.trim();
                (!prefix.is_empty()).then(|| PathBuf::from(prefix))
            }
            Err(e) => {
                warn!(interpreter = %interpreter.id, error = %e, "Failed to query sys.prefix");
                None
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use kernelpaths_core::EnvVars;

    use crate::environment::ProcessEnvironmentProvider;

    /// A shell script standing in for an interpreter.
    fn fake_interpreter(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("python");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn request(executable: PathBuf) -> ExecRequest {
        ExecRequest {
            interpreter: InterpreterInfo::from_executable(executable),
            resource: None,
            script: PathBuf::from("print_jupyter_data_dir.py"),
            args: vec!["--flag".to_string()],
        }
    }

    #[tokio::test]
    async fn test_execute_captures_output_and_passes_script() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_interpreter(dir.path(), r#"echo "$1 $2"; echo warn >&2"#);

        let output = PythonExecutor::new(Duration::from_secs(10))
            .execute(&request(exe))
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "print_jupyter_data_dir.py --flag");
        assert_eq!(output.stderr.trim(), "warn");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_interpreter(dir.path(), "echo boom >&2; exit 3");

        let err = PythonExecutor::new(Duration::from_secs(10))
            .execute(&request(exe))
            .await
            .unwrap_err();
        match err {
            PortError::Execution(message) => assert!(message.contains("boom")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_executable_is_an_error() {
        let err = PythonExecutor::new(Duration::from_secs(10))
            .execute(&request(PathBuf::from("/nonexistent/python")))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Execution(_)));
    }

    #[tokio::test]
    async fn test_slow_interpreter_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_interpreter(dir.path(), "sleep 5");

        let err = PythonExecutor::new(Duration::from_millis(200))
            .execute(&request(exe))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_children_see_provider_variables() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_interpreter(dir.path(), r#"printf "%s" "$KP_MARKER""#);
        let vars: EnvVars = [("KP_MARKER".to_string(), "from-provider".to_string())]
            .into_iter()
            .collect();
        let executor = PythonExecutor::new(Duration::from_secs(10))
            .with_environment(Arc::new(ProcessEnvironmentProvider::with_base(vars)));

        let output = executor.execute(&request(exe)).await.unwrap();
        assert_eq!(output.stdout, "from-provider");
    }

    #[tokio::test]
    async fn test_sys_prefix_queries_interpreter_once_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_interpreter(dir.path(), r#"[ "$1" = "-c" ] && printf "/opt/env\n""#);
        let executor = PythonExecutor::new(Duration::from_secs(10));

        let unknown = InterpreterInfo::from_executable(&exe);
        assert_eq!(executor.sys_prefix(&unknown).await, Some(PathBuf::from("/opt/env")));

        let known = InterpreterInfo::from_executable(&exe).with_sys_prefix("/known");
        assert_eq!(executor.sys_prefix(&known).await, Some(PathBuf::from("/known")));
    }

    #[tokio::test]
    async fn test_resource_dir() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = dir.path().join("nb.ipynb");
        assert_eq!(
            resource_dir(notebook.to_str()).await,
            Some(dir.path().to_path_buf())
        );
        assert_eq!(
            resource_dir(dir.path().to_str()).await,
            Some(dir.path().to_path_buf())
        );
        assert_eq!(resource_dir(Some("/nonexistent/dir/nb.ipynb")).await, None);
        assert_eq!(resource_dir(None).await, None);
    }

    #[tokio::test]
    async fn test_execute_runs_in_resource_directory() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_interpreter(dir.path(), "pwd");
        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();

        let mut req = request(exe);
        req.resource = Some(work.join("nb.ipynb").to_string_lossy().into_owned());
        let output = PythonExecutor::new(Duration::from_secs(10))
            .execute(&req)
            .await
            .unwrap();
        assert_eq!(
            fs::canonicalize(output.stdout.trim()).unwrap(),
            fs::canonicalize(&work).unwrap()
        );
    }
}

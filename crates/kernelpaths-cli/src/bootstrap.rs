//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where adapters are wired together for the
//! CLI. All concrete implementations are instantiated here:
//! - Host platform, filesystem and JSON state store (via kernelpaths-runtime)
//! - Environment provider over the process environment and `.env` files
//! - Python executor for interpreter queries
//! - The search-path service (via kernelpaths-core)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kernelpaths_core::{
    InterpreterInfo, KernelPathsConfig, KernelSearchPathService, SearchContext, SearchPathPorts,
    ServiceOptions, data_root, validate_config,
};
use kernelpaths_runtime::{
    HostPlatform, JsonFileStore, ProcessEnvironmentProvider, PythonExecutor, TokioFileSystem,
    ensure_probe_script,
};
use tracing::{debug, warn};

use crate::error::CliError;
use crate::parser::Cli;

const CONFIG_FILE_NAME: &str = "config.json";

/// Bootstrap options taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit config file; `config.json` under the data root otherwise.
    pub config_path: Option<PathBuf>,
    /// Overrides the configured `.env` file.
    pub env_file: Option<PathBuf>,
    /// Interpreter used for data-dir queries.
    pub python: Option<PathBuf>,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_path: cli.config.clone(),
            env_file: cli.env_file.clone(),
            python: cli.python.clone(),
        }
    }

    /// Load, override and validate the engine configuration.
    pub fn resolve(&self) -> Result<KernelPathsConfig, CliError> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => data_root()?.join(CONFIG_FILE_NAME),
        };
        let mut config = KernelPathsConfig::load(&path)?;
        if let Some(env_file) = &self.env_file {
            config.env_file = Some(env_file.clone());
        }
        validate_config(&config)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// The search-path service.
    pub service: KernelSearchPathService,
    /// Environment provider shared with the service and executor.
    pub environment: Arc<ProcessEnvironmentProvider>,
    /// Interpreter selected with `--python`.
    pub interpreter: Option<InterpreterInfo>,
}

impl CliContext {
    /// Access the search-path service.
    pub const fn service(&self) -> &KernelSearchPathService {
        &self.service
    }

    /// Query context for the selected interpreter and an optional resource.
    pub fn search_context(&self, resource: Option<String>) -> SearchContext {
        SearchContext {
            resource,
            interpreter: self.interpreter.clone(),
        }
    }
}

/// Bootstrap the CLI application.
///
/// This is the composition root. It:
/// 1. Loads and validates the configuration
/// 2. Builds the environment provider over the configured `.env` files
/// 3. Opens the durable state store
/// 4. Deploys the data-dir probe script
/// 5. Assembles the search-path service from the adapters
pub async fn bootstrap(cli_config: CliConfig) -> Result<CliContext, CliError> {
    // 1. Configuration
    let config = cli_config.resolve()?;

    // 2. Environment provider
    let mut environment = ProcessEnvironmentProvider::new()
        .with_env_files(Some(config.effective_env_file()), config.python_env_file.clone());
    if let Some(ttl) = config.env_cache_ttl() {
        environment = environment.with_cache_ttl(ttl);
    }
    let environment = Arc::new(environment);

    // 3. State store
    let store = JsonFileStore::open(config.effective_state_file()?).await?;

    // 4. Probe script; data dirs are still resolved without it
    let options = ServiceOptions::from_config(&config);
    deploy_probe_script(&options.probe_script).await;

    // 5. Service
    let executor = PythonExecutor::new(config.interpreter_timeout())
        .with_environment(environment.clone());
    let ports = SearchPathPorts::new(
        Arc::new(HostPlatform::new()),
        environment.clone(),
        Arc::new(TokioFileSystem::new()),
        Arc::new(executor),
        Arc::new(store),
    );

    Ok(CliContext {
        service: KernelSearchPathService::new(ports, options),
        environment,
        interpreter: cli_config.python.map(InterpreterInfo::from_executable),
    })
}

async fn deploy_probe_script(path: &Path) {
    if let Err(e) = ensure_probe_script(path).await {
        warn!(path = %path.display(), error = %e, "Failed to deploy data-dir probe script");
    }
}

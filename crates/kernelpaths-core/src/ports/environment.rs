//! Environment snapshot provider port.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::PortError;
use crate::domain::EnvVars;
use crate::events::EnvironmentEvent;

/// Which consumer the variables are being resolved for.
///
/// Providers may layer a Python-specific env file on top of the general one
/// for [`EnvironmentScope::RunPythonCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentScope {
    RunPythonCode,
    RunNonPythonCode,
}

/// Supplies environment snapshots and announces when they change.
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    /// Resolve the full set of variables for a scope.
    async fn environment_variables(&self, scope: EnvironmentScope) -> Result<EnvVars, PortError>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<EnvironmentEvent>;
}

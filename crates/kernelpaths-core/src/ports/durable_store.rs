//! Durable key/value store port.
//!
//! The engine only needs "get with default" and "set"; values are JSON so
//! implementations can persist them however they like.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::PortError;

/// Key/value storage that survives process restarts.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// The stored value, or `None` if the key was never written.
    fn get_value(&self, key: &str) -> Option<Value>;

    /// Store a value. `Value::Null` clears the key.
    async fn set_value(&self, key: &str, value: Value) -> Result<(), PortError>;
}

impl dyn DurableStore {
    /// Typed read; a missing or undecodable value yields `default`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get_value(key) {
            None | Some(Value::Null) => default,
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(key, error = %e, "Discarding undecodable stored value");
                default
            }),
        }
    }

    /// Typed write.
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), PortError> {
        let value = serde_json::to_value(value).map_err(|e| PortError::Store(e.to_string()))?;
        self.set_value(key, value).await
    }
}

//! Durable store backed by a JSON file.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use kernelpaths_core::{DurableStore, PortError};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Key/value state in a single JSON object on disk.
///
/// The file is read once at open. Every write rewrites the whole file via a
/// temporary sibling and a rename; concurrent writers are last-writer-wins.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A corrupt file is logged and treated as empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PortError> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable state file");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(PortError::io(&path, &e)),
        };
        debug!(path = %path.display(), keys = values.len(), "Opened state file");

        Ok(Self {
            path,
            values: RwLock::new(values),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, contents: String) -> Result<(), PortError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::io(parent, &e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| PortError::io(&tmp, &e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PortError::io(&self.path, &e))
    }
}

#[async_trait]
impl DurableStore for JsonFileStore {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<(), PortError> {
        let _guard = self.write_lock.lock().await;
        let contents = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            if value.is_null() {
                values.remove(key);
            } else {
                values.insert(key.to_string(), value);
            }
            serde_json::to_string_pretty(&*values).map_err(|e| PortError::Store(e.to_string()))?
        };
        self.flush(contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("state.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(store.get_value("root"), None);
        assert_ok!(store.set_value("root", json!("/home/u/kernels")).await);
        assert_ok!(store.set_value("paths", json!(["/a", "/b"])).await);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_value("root"), Some(json!("/home/u/kernels")));
        assert_eq!(reopened.get_value("paths"), Some(json!(["/a", "/b"])));
    }

    #[tokio::test]
    async fn test_null_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("state.json")).await.unwrap();

        assert_ok!(store.set_value("root", json!("/x")).await);
        assert_ok!(store.set_value("root", Value::Null).await);
        assert_eq!(store.get_value("root"), None);

        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert!(!on_disk.contains("root"));
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ truncated").unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(store.get_value("anything"), None);
        assert_ok!(store.set_value("k", json!(1)).await);
        assert_eq!(JsonFileStore::open(&path).await.unwrap().get_value("k"), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_typed_helpers_through_trait_object() {
        let dir = tempfile::tempdir().unwrap();
        let store: std::sync::Arc<dyn DurableStore> =
            std::sync::Arc::new(JsonFileStore::open(dir.path().join("s.json")).await.unwrap());

        assert_ok!(store.set("paths", &vec!["/a".to_string()]).await);
        assert_eq!(store.get("paths", Vec::<String>::new()), vec!["/a".to_string()]);
        assert_eq!(store.get("missing", 7_u32), 7);
    }
}

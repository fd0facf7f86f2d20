//! File-backed storage for exported extension data
//!
//! A single JSON file shaped like the extension's exported local storage:
//!
//! ```json
//! { "visitHistory": { "https://a/": "2024-01-01T00:00:00Z" },
//!   "filters": ["^https://a"] }
//! ```
//!
//! Every operation reads the whole file, transforms one key, and writes the
//! whole file back, matching the extension's storage access pattern.

use std::path::PathBuf;

use serde_json::{Map, Value};

use rv_core::{Storage, StorageError, VisitHistory};

const HISTORY_KEY: &str = "visitHistory";
const FILTERS_KEY: &str = "filters";

pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StorageError::Backend(format!(
                    "read '{}': {e}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError::Backend(format!(
                "'{}' is not a JSON object",
                self.path.display()
            ))),
            Err(source) => Err(StorageError::Malformed {
                key: "storage file",
                source,
            }),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(&Value::Object(map.clone()))
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        tokio::fs::write(&self.path, text).await.map_err(|e| {
            StorageError::Backend(format!("write '{}': {e}", self.path.display()))
        })
    }

    async fn load_key<T: serde::de::DeserializeOwned>(
        &self,
        key: &'static str,
    ) -> Result<Option<T>, StorageError> {
        let map = self.read_all().await?;
        match map.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| StorageError::Malformed { key, source }),
            None => Ok(None),
        }
    }

    async fn store_key<T: serde::Serialize>(
        &self,
        key: &'static str,
        value: &T,
    ) -> Result<(), StorageError> {
        let mut map = self.read_all().await?;
        let value = serde_json::to_value(value).map_err(|e| StorageError::Backend(e.to_string()))?;
        map.insert(key.to_string(), value);
        self.write_all(&map).await
    }
}

impl Storage for JsonFileStorage {
    async fn load_history(&self) -> Result<Option<VisitHistory>, StorageError> {
        self.load_key(HISTORY_KEY).await
    }

    async fn store_history(&self, history: &VisitHistory) -> Result<(), StorageError> {
        self.store_key(HISTORY_KEY, history).await
    }

    async fn remove_history(&self) -> Result<(), StorageError> {
        let mut map = self.read_all().await?;
        map.remove(HISTORY_KEY);
        self.write_all(&map).await
    }

    async fn load_filters(&self) -> Result<Option<Vec<String>>, StorageError> {
        self.load_key(FILTERS_KEY).await
    }

    async fn store_filters(&self, filters: &[String]) -> Result<(), StorageError> {
        self.store_key(FILTERS_KEY, &filters.to_vec()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_unwritten() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("storage.json"));
        assert!(storage.load_history().await.unwrap().is_none());
        assert!(storage.load_filters().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn round_trips_both_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("storage.json"));

        let mut history = VisitHistory::default();
        history.set("https://a.test/", "t1");
        storage.store_history(&history).await.unwrap();
        storage
            .store_filters(&["^https://a".to_string()])
            .await
            .unwrap();

        let loaded = storage.load_history().await.unwrap().unwrap();
        assert_eq!(loaded.get("https://a.test/"), Some("t1"));
        assert_eq!(
            storage.load_filters().await.unwrap(),
            Some(vec!["^https://a".to_string()])
        );

        // Removing the history leaves the filters in place.
        storage.remove_history().await.unwrap();
        assert!(storage.load_history().await.unwrap().is_none());
        assert!(storage.load_filters().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rejects_non_object_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        tokio::fs::write(&path, "[1,2,3]").await.unwrap();
        let storage = JsonFileStorage::new(path);
        assert!(storage.load_history().await.is_err());
    }
}

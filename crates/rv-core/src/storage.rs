//! Persisted key-value store boundary
//!
//! The extension keeps two top-level values in the host's local storage:
//! `visitHistory` (URL -> last-visit timestamp) and `filters` (the raw
//! whitelist pattern list). This trait is the whole contract with that
//! store: whole-value reads and writes, nothing finer-grained.
//!
//! There is deliberately no compare-and-swap primitive. Every history
//! operation is an independent read, local transform, and write-back, so
//! two overlapping operations can interleave and lose an update. That
//! matches the behavior of the storage collaborator this models.

use std::sync::Mutex;

use indexmap::IndexMap;

use thiserror::Error;

use crate::history::VisitHistory;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend itself failed (I/O, host API rejection, ...).
    #[error("storage backend: {0}")]
    Backend(String),

    /// A stored value did not decode as the expected shape.
    #[error("malformed value for key '{key}': {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Async access to the two persisted values.
///
/// `load_*` return `None` when the key has never been written, which is
/// distinct from an empty value.
#[allow(async_fn_in_trait)] // single execution context; no Send bound wanted
pub trait Storage {
    async fn load_history(&self) -> Result<Option<VisitHistory>, StorageError>;
    async fn store_history(&self, history: &VisitHistory) -> Result<(), StorageError>;
    async fn remove_history(&self) -> Result<(), StorageError>;

    async fn load_filters(&self) -> Result<Option<Vec<String>>, StorageError>;
    async fn store_filters(&self, filters: &[String]) -> Result<(), StorageError>;
}

impl<T: Storage> Storage for &T {
    async fn load_history(&self) -> Result<Option<VisitHistory>, StorageError> {
        (**self).load_history().await
    }

    async fn store_history(&self, history: &VisitHistory) -> Result<(), StorageError> {
        (**self).store_history(history).await
    }

    async fn remove_history(&self) -> Result<(), StorageError> {
        (**self).remove_history().await
    }

    async fn load_filters(&self) -> Result<Option<Vec<String>>, StorageError> {
        (**self).load_filters().await
    }

    async fn store_filters(&self, filters: &[String]) -> Result<(), StorageError> {
        (**self).store_filters(filters).await
    }
}

/// In-memory backend for tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    history: Option<IndexMap<String, String>>,
    filters: Option<Vec<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the history map, as if a previous session had written it.
    pub fn with_history<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.history = Some(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            );
        }
        self
    }

    /// Seed the persisted whitelist.
    pub fn with_filters<I, S>(self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.filters = Some(filters.into_iter().map(Into::into).collect());
        }
        self
    }
}

impl Storage for MemoryStorage {
    async fn load_history(&self) -> Result<Option<VisitHistory>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.history.clone().map(VisitHistory::from_entries))
    }

    async fn store_history(&self, history: &VisitHistory) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.history = Some(history.entries().clone());
        Ok(())
    }

    async fn remove_history(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.history = None;
        Ok(())
    }

    async fn load_filters(&self) -> Result<Option<Vec<String>>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.filters.clone())
    }

    async fn store_filters(&self, filters: &[String]) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.filters = Some(filters.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unwritten_keys_load_as_none() {
        let storage = MemoryStorage::new();
        assert!(storage.load_history().await.unwrap().is_none());
        assert!(storage.load_filters().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_round_trips() {
        let storage = MemoryStorage::new();
        let mut history = VisitHistory::default();
        history.set("https://a.test/1", "t1");
        storage.store_history(&history).await.unwrap();

        let loaded = storage.load_history().await.unwrap().unwrap();
        assert_eq!(loaded.get("https://a.test/1"), Some("t1"));

        storage.remove_history().await.unwrap();
        assert!(storage.load_history().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_filters_distinct_from_unwritten() {
        let storage = MemoryStorage::new();
        storage.store_filters(&[]).await.unwrap();
        assert_eq!(storage.load_filters().await.unwrap(), Some(vec![]));
    }
}

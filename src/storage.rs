use crate::errors::StoreError;
use crate::models::DayHistoryEntry;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, warn};

pub const HISTORY_KEY: &str = "care-checklist-history";

/// Key-based JSON store mirrored to a single file, one value per key.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl LocalStore {
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            values: Map::new(),
        }
    }

    /// Reads the store file. A missing file is an empty store; an unreadable
    /// or corrupt one is logged and also treated as empty.
    pub async fn open(path: PathBuf) -> Self {
        let values = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Map<String, Value>>(&bytes) {
                Ok(values) => values,
                Err(err) => {
                    error!("failed to parse store file {}: {err}", path.display());
                    Map::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => {
                error!("failed to read store file {}: {err}", path.display());
                Map::new()
            }
        };
        Self { path, values }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("ignoring malformed value under {key}: {err}");
                None
            }
        }
    }

    /// Writes `value` under `key` and persists the whole store. The in-memory
    /// map is only updated once the file write succeeded.
    pub async fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let mut next = self.values.clone();
        next.insert(key.to_string(), serde_json::to_value(value)?);
        persist(&self.path, &next).await?;
        self.values = next;
        Ok(())
    }

    pub fn read_history(&self) -> Vec<DayHistoryEntry> {
        self.get(HISTORY_KEY).unwrap_or_default()
    }

    pub async fn write_history(&mut self, history: &[DayHistoryEntry]) -> Result<(), StoreError> {
        self.set(HISTORY_KEY, &history).await
    }
}

async fn persist(path: &Path, values: &Map<String, Value>) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(values)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "care_checklist_store_{name}_{}_{nanos}.json",
            std::process::id()
        ))
    }

    fn entry(date: &str, completed: u32) -> DayHistoryEntry {
        DayHistoryEntry {
            date: date.to_string(),
            completed_count: completed,
            total_count: 5,
        }
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let store = LocalStore::open(temp_store_path("missing")).await;
        assert!(store.read_history().is_empty());
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let path = temp_store_path("reopen");
        let mut store = LocalStore::open(path.clone()).await;
        let history = vec![entry("01.01.2024", 3), entry("02.01.2024", 5)];
        store.write_history(&history).await.unwrap();

        let reopened = LocalStore::open(path.clone()).await;
        assert_eq!(reopened.read_history(), history);

        let raw: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw[HISTORY_KEY][0]["completedCount"], 3);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn corrupt_file_opens_empty() {
        let path = temp_store_path("corrupt");
        std::fs::write(&path, b"{not json").unwrap();
        let store = LocalStore::open(path.clone()).await;
        assert!(store.read_history().is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn other_keys_are_preserved() {
        let path = temp_store_path("keys");
        let mut store = LocalStore::open(path.clone()).await;
        store.set("theme", &"dark").await.unwrap();
        store.write_history(&[entry("03.01.2024", 1)]).await.unwrap();

        let reopened = LocalStore::open(path.clone()).await;
        assert_eq!(reopened.get::<String>("theme").as_deref(), Some("dark"));
        assert_eq!(reopened.read_history().len(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_values() {
        let dir = temp_store_path("no_such_dir");
        let mut store = LocalStore::empty(dir.join("nested").join("state.json"));
        assert!(store.write_history(&[entry("04.01.2024", 2)]).await.is_err());
        assert!(store.read_history().is_empty());
    }
}

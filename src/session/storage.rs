//! Session checkpoint storage backends.

use crate::error::{StorageError, StorageResult};
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::debug;

/// Current time in unix milliseconds.
#[must_use]
pub(crate) fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Checkpointed state of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// Caller-chosen session key.
    pub key: String,
    /// Append-only conversation log.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Reasoning steps consumed by the current run.
    #[serde(default)]
    pub step_count: u32,
    /// Creation time, unix millis.
    pub created_at: u64,
    /// Last save time, unix millis.
    pub updated_at: u64,
}

impl SessionData {
    /// Create an empty session for the given key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let now = timestamp_ms();
        Self {
            key: key.into(),
            messages: Vec::new(),
            step_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Checkpoint store contract.
///
/// `save` is last-write-wins; a `load` after a completed `save` for the same
/// key observes that write. `load` of an unknown key is `Ok(None)`.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Load a session by key.
    async fn load(&self, key: &str) -> StorageResult<Option<SessionData>>;

    /// Persist a session, replacing any previous snapshot for its key.
    async fn save(&self, data: &SessionData) -> StorageResult<()>;

    /// Delete a session. Deleting an unknown key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// List all stored session keys.
    async fn list_keys(&self) -> StorageResult<Vec<String>>;
}

/// In-memory storage. State is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self, key: &str) -> StorageResult<Option<SessionData>> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn save(&self, data: &SessionData) -> StorageResult<()> {
        self.sessions
            .write()
            .await
            .insert(data.key.clone(), data.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.sessions.read().await.keys().cloned().collect())
    }
}

/// File-backed storage, one JSON file per session key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File path for a session key, sanitized for the filesystem.
    fn session_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| match c {
                ':' | '/' | '\\' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn load(&self, key: &str) -> StorageResult<Option<SessionData>> {
        let path = self.session_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let data = serde_json::from_str(&content)?;
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn save(&self, data: &SessionData) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.session_path(&data.key);
        let content = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&path, content).await?;
        debug!(key = %data.key, path = %path.display(), "session saved");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.session_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list_keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(StorageError::Io(e)),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            // The file name is sanitized; the original key lives in the JSON.
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            if let Ok(data) = serde_json::from_str::<SessionData>(&content) {
                keys.push(data.key);
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_load_after_save() {
        let storage = MemoryStorage::new();
        assert!(storage.load("cli").await.unwrap().is_none());

        let mut data = SessionData::new("cli");
        data.messages.push(Message::user("hi"));
        storage.save(&data).await.unwrap();

        let loaded = storage.load("cli").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].content, "hi");
    }

    #[tokio::test]
    async fn memory_save_is_last_write_wins() {
        let storage = MemoryStorage::new();
        let mut data = SessionData::new("cli");
        storage.save(&data).await.unwrap();

        data.messages.push(Message::user("one"));
        storage.save(&data).await.unwrap();
        data.messages.push(Message::assistant("two"));
        storage.save(&data).await.unwrap();

        let loaded = storage.load("cli").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 2);
    }

    #[tokio::test]
    async fn memory_delete_unknown_is_ok() {
        let storage = MemoryStorage::new();
        storage.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let mut data = SessionData::new("user:42");
        data.messages.push(Message::user("hello"));
        data.step_count = 1;
        storage.save(&data).await.unwrap();

        let loaded = storage.load("user:42").await.unwrap().unwrap();
        assert_eq!(loaded.key, "user:42");
        assert_eq!(loaded.step_count, 1);
        assert_eq!(loaded.messages[0].content, "hello");

        let keys = storage.list_keys().await.unwrap();
        assert_eq!(keys, vec!["user:42"]);

        storage.delete("user:42").await.unwrap();
        assert!(storage.load("user:42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_list_keys_returns_original_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.save(&SessionData::new("tg:1001")).await.unwrap();
        storage.save(&SessionData::new("cli")).await.unwrap();

        let mut keys = storage.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["cli", "tg:1001"]);
    }

    #[tokio::test]
    async fn file_load_missing_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("never-created"));
        assert!(storage.load("cli").await.unwrap().is_none());
        assert!(storage.list_keys().await.unwrap().is_empty());
    }
}

//! Session manager: storage plus per-key run exclusivity.

use super::storage::{SessionData, SessionStorage, timestamp_ms};
use crate::error::StorageResult;
use crate::message::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// A loaded session with change tracking.
#[derive(Debug)]
pub struct Session {
    data: SessionData,
    modified: bool,
}

impl Session {
    fn new(data: SessionData) -> Self {
        Self {
            data,
            modified: false,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.data.key
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.data.messages
    }

    /// Append a message to the log.
    pub fn push(&mut self, message: Message) {
        self.data.messages.push(message);
        self.modified = true;
    }

    #[must_use]
    pub fn step_count(&self) -> u32 {
        self.data.step_count
    }

    /// Record one consumed reasoning step.
    pub fn bump_step(&mut self) {
        self.data.step_count += 1;
        self.modified = true;
    }

    /// Reset the step counter at the start of a run. The limit bounds steps
    /// per run, not per session lifetime.
    pub fn reset_steps(&mut self) {
        if self.data.step_count != 0 {
            self.data.step_count = 0;
            self.modified = true;
        }
    }

    /// Drop all messages, keeping the key.
    pub fn clear(&mut self) {
        self.data.messages.clear();
        self.data.step_count = 0;
        self.modified = true;
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// Manages sessions over a storage backend.
///
/// `run_guard` hands out a per-key async mutex guard: two runs for the same
/// key serialize, runs for different keys proceed in parallel.
pub struct SessionManager {
    storage: Arc<dyn SessionStorage>,
    run_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

impl SessionManager {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            run_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the exclusive run lock for a session key, waiting if another
    /// run holds it.
    pub async fn run_guard(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.run_locks.lock().await;
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Load a session, creating an empty one if the key is unknown.
    pub async fn get_or_create(&self, key: &str) -> StorageResult<Session> {
        match self.storage.load(key).await? {
            Some(data) => Ok(Session::new(data)),
            None => {
                debug!(key, "creating new session");
                Ok(Session::new(SessionData::new(key)))
            }
        }
    }

    /// Checkpoint a session if it changed since the last save.
    pub async fn save(&self, session: &mut Session) -> StorageResult<()> {
        if !session.modified {
            return Ok(());
        }
        session.data.updated_at = timestamp_ms();
        self.storage.save(&session.data).await?;
        session.modified = false;
        Ok(())
    }

    /// Delete a stored session.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.storage.delete(key).await
    }

    /// List stored session keys.
    pub async fn list_keys(&self) -> StorageResult<Vec<String>> {
        self.storage.list_keys().await
    }
}

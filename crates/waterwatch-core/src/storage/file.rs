use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

use super::{KeyValueStore, StoreChange, StoreError};

/// Capacity of the change-notification channel
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Key-value store persisted as a single JSON object on disk.
///
/// Writes go through a temp file and a rename so a concurrent reader never
/// sees a partially written record. Clones share the same path and
/// notification channel.
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    changes: broadcast::Sender<StoreChange>,
}

impl FileStore {
    /// Open a store at `path`, creating the parent directory if needed.
    ///
    /// Directory-creation failure is logged and deferred rather than fatal;
    /// the first write surfaces the error through the normal path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    warn!("failed to create state directory {:?}: {err}", parent);
                }
            }
        }
        Self {
            path,
            changes: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole record. A missing file is an empty record; corrupt
    /// JSON is an error for the caller to degrade.
    async fn load(&self) -> Result<HashMap<String, Value>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let all = self.load().await?;
        Ok(keys
            .iter()
            .filter_map(|key| all.get(*key).map(|v| ((*key).to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), StoreError> {
        let mut all = self.load().await?;
        let keys: Vec<String> = entries.keys().cloned().collect();
        all.extend(entries);

        let json = serde_json::to_string_pretty(&all)?;
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, json.as_bytes()).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        let _ = self.changes.send(StoreChange { keys });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

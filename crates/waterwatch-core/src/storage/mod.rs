//! Key-value persistence adapters.
//!
//! The trait mirrors the extension-storage surface the counter was written
//! against: batch `get`, batch `set`, and a change-notification stream.
//! [`MemoryStore`] backs tests and embedders; [`FileStore`] persists to a
//! single JSON file for the CLI host.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

/// Error type for key-value store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be parsed
    #[error("stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Keys written by a completed `set` call
#[derive(Debug, Clone)]
pub struct StoreChange {
    /// Keys whose values were written
    pub keys: Vec<String>,
}

/// Asynchronous key-value persistence shared by all counter call sites
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the requested keys. Absent keys are simply missing from the
    /// returned map; callers resolve their own defaults.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError>;

    /// Write all entries in one batch
    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), StoreError>;

    /// Subscribe to change notifications for subsequent `set` calls
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        (**self).get(keys).await
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), StoreError> {
        (**self).set(entries).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        (**self).subscribe()
    }
}

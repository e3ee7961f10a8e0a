use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{KeyValueStore, StoreChange, StoreError};

/// Capacity of the change-notification channel
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// In-memory key-value store.
///
/// Clones share the same underlying map, so a cloned handle behaves like a
/// second call site against the same storage area.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            changes: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let entries = self.entries.lock();
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| ((*key).to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_entries: HashMap<String, Value>) -> Result<(), StoreError> {
        let keys: Vec<String> = new_entries.keys().cloned().collect();
        self.entries.lock().extend(new_entries);
        // No receivers is fine; notification is best-effort
        let _ = self.changes.send(StoreChange { keys });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_get_returns_only_present_keys() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([("a".to_string(), Value::from(1))]))
            .await
            .expect("set");

        let record = store.get(&["a", "missing"]).await.expect("get");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("a"), Some(&Value::from(1)));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store
            .set(HashMap::from([("k".to_string(), Value::from("v"))]))
            .await
            .expect("set");

        let record = other.get(&["k"]).await.expect("get");
        assert_eq!(record.get("k"), Some(&Value::from("v")));
    }

    #[tokio::test]
    async fn test_set_notifies_subscribers() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();
        store
            .set(HashMap::from([("k".to_string(), Value::from(2))]))
            .await
            .expect("set");

        let change = changes.try_recv().expect("one change");
        assert_eq!(change.keys, vec!["k".to_string()]);
    }
}

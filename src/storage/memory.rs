use dashmap::DashMap;
use serde_json::Value;

/// The shard held by this node.
///
/// Values are opaque JSON documents; the store never looks inside them.
/// Each operation is atomic for its key and no guard ever outlives the
/// call, so nothing is held across an await point or a network call.
#[derive(Debug, Default)]
pub struct LocalStore {
    entries: DashMap<String, Value>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional upsert.
    pub fn set(&self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    /// `None` means "not on this node", which the caller treats as absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Returns whether the key was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

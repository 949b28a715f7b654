//! In-memory [`KeyValueStore`].

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::{KeyValueStore, StoreResult};

/// A store that forgets everything on drop. Keys within a namespace are
/// kept ordered so `keys()` matches [`super::SledStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    namespaces: RwLock<HashMap<String, BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held in a namespace.
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .get(namespace)
            .map_or(0, BTreeMap::len)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self
            .namespaces
            .read()
            .get(namespace)
            .and_then(|ns| ns.get(key).cloned()))
    }

    fn put(&self, namespace: &str, key: &[u8], value: Option<&[u8]>) -> StoreResult<()> {
        let mut namespaces = self.namespaces.write();
        match value {
            Some(bytes) => {
                namespaces
                    .entry(namespace.to_string())
                    .or_default()
                    .insert(key.to_vec(), bytes.to_vec());
            }
            None => {
                if let Some(ns) = namespaces.get_mut(namespace) {
                    ns.remove(key);
                }
            }
        }
        Ok(())
    }

    fn keys(&self, namespace: &str) -> StoreResult<Vec<Vec<u8>>> {
        Ok(self
            .namespaces
            .read()
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default())
    }
}

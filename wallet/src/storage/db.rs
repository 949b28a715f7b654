//! # SledStore: Persistent Wallet Storage
//!
//! The on-disk [`KeyValueStore`], built on sled's embedded key-value store.
//! Each namespace maps to a sled tree, opened lazily on first use and cached
//! for the life of the handle.
//!
//! Writes are flushed before returning, so a credential added by one CLI
//! invocation is visible to the next one even if the process is killed
//! right after.

use dashmap::DashMap;
use sled::{Db, Tree};
use std::path::Path;

use super::{KeyValueStore, StoreResult};

/// Persistent storage engine for wallet state.
///
/// Cloning is cheap; clones share the underlying database.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    trees: std::sync::Arc<DashMap<String, Tree>>,
}

impl SledStore {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Ok(Self::from_db(db))
    }

    /// A database that lives in a temporary location and is removed when the
    /// last handle drops. Ideal for unit tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    fn from_db(db: Db) -> Self {
        Self {
            db,
            trees: std::sync::Arc::new(DashMap::new()),
        }
    }

    fn tree(&self, namespace: &str) -> StoreResult<Tree> {
        if let Some(tree) = self.trees.get(namespace) {
            return Ok(tree.clone());
        }
        let tree = self.db.open_tree(namespace)?;
        self.trees.insert(namespace.to_string(), tree.clone());
        Ok(tree)
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, namespace: &str, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.tree(namespace)?.get(key)?.map(|v| v.to_vec()))
    }

    fn put(&self, namespace: &str, key: &[u8], value: Option<&[u8]>) -> StoreResult<()> {
        let tree = self.tree(namespace)?;
        match value {
            Some(bytes) => {
                tree.insert(key, bytes)?;
            }
            None => {
                tree.remove(key)?;
            }
        }
        tree.flush()?;
        Ok(())
    }

    fn keys(&self, namespace: &str) -> StoreResult<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        for entry in self.tree(namespace)?.iter() {
            let (key, _) = entry?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }
}

//! # Storage Module
//!
//! The wallet keeps all durable state in an opaque, namespaced key-value
//! store. Credentials, staged transactions, and the scanner checkpoint are
//! each a namespace; nothing above this module assumes more than
//! get/put/delete semantics.
//!
//! ## Architecture
//!
//! ```text
//! db.rs     : SledStore: one sled tree per namespace, on disk or temporary
//! memory.rs : MemoryStore: HashMap behind a RwLock, for tests and dry runs
//! ```
//!
//! ## Namespaces
//!
//! | Namespace          | Key                  | Value                        |
//! |--------------------|----------------------|------------------------------|
//! | `wallet-names`     | credential name      | WalletEntry binary encoding  |
//! | `wallet-addresses` | address (32 bytes)   | WalletEntry binary encoding  |
//! | `build-trans`      | staged tx key        | Transaction binary encoding  |
//! | `scanner`          | `last-processed`     | directory block KeyMR        |

pub mod db;
pub mod memory;

pub use db::SledStore;
pub use memory::MemoryStore;

/// Credentials keyed by name.
pub const NS_WALLET_NAMES: &str = "wallet-names";

/// Credentials keyed by derived address bytes.
pub const NS_WALLET_ADDRESSES: &str = "wallet-addresses";

/// Transactions under construction, keyed by caller-chosen token.
pub const NS_BUILD_TRANSACTIONS: &str = "build-trans";

/// History scanner checkpoint.
pub const NS_SCANNER: &str = "scanner";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("corrupt record in '{namespace}': {reason}")]
    Corrupt { namespace: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A namespaced byte store.
///
/// `put` with `None` deletes the key. Implementations must be usable from
/// several tasks at once; sequencing of read-modify-write cycles is the
/// caller's job.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, namespace: &str, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn put(&self, namespace: &str, key: &[u8], value: Option<&[u8]>) -> StoreResult<()>;

    /// All keys in a namespace, in ascending byte order.
    fn keys(&self, namespace: &str) -> StoreResult<Vec<Vec<u8>>>;

    fn contains(&self, namespace: &str, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(namespace, key)?.is_some())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, namespace: &str, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(namespace, key)
    }

    fn put(&self, namespace: &str, key: &[u8], value: Option<&[u8]>) -> StoreResult<()> {
        (**self).put(namespace, key, value)
    }

    fn keys(&self, namespace: &str) -> StoreResult<Vec<Vec<u8>>> {
        (**self).keys(namespace)
    }
}

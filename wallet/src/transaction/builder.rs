//! Staged transaction construction.
//!
//! The [`TransactionBuilder`] keeps transactions under caller-chosen keys in
//! the `build-trans` namespace while they are assembled:
//!
//! ```text
//!            start                    submit (after local validation)
//!   ABSENT ─────────▶ OPEN ─────────────────────────────────────▶ ABSENT
//!                     │  ▲                     delete
//!                     └──┘ add_input / add_output / add_ec_output / sign
//! ```
//!
//! Signing does not close a transaction; it can be edited and re-signed
//! until it is submitted. Each key has its own async mutex, so concurrent
//! calls on one key run one after another while different keys proceed
//! independently.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::types::{AuthBlock, Transaction, TxAddress};
use super::validation::{validate, validate_signatures};
use super::TransactionError;
use crate::address::{parse_fixed_point, Address, AddressKind, AddressRef};
use crate::config::{MAX_KEY_LENGTH, PATH_FACTOID_SUBMIT};
use crate::credential::{CredentialStore, EntryError};
use crate::crypto::Hash;
use crate::node::{NodeClient, RelayOutcome};
use crate::storage::{KeyValueStore, NS_BUILD_TRANSACTIONS};

/// Result of relaying a transaction.
#[derive(Debug, Clone)]
pub struct Submission {
    pub txid: Hash,
    pub outcome: RelayOutcome,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Input,
    Output,
    EcOutput,
}

impl Slot {
    fn kind(self) -> AddressKind {
        match self {
            Self::Input | Self::Output => AddressKind::Factoid,
            Self::EcOutput => AddressKind::EntryCredit,
        }
    }
}

/// Keyed staging area for transactions under construction.
pub struct TransactionBuilder {
    store: Arc<dyn KeyValueStore>,
    credentials: CredentialStore,
    node: Arc<dyn NodeClient>,
    ec_rate: u64,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TransactionBuilder {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        credentials: CredentialStore,
        node: Arc<dyn NodeClient>,
        ec_rate: u64,
    ) -> Self {
        Self {
            store,
            credentials,
            node,
            ec_rate,
            locks: DashMap::new(),
        }
    }

    async fn lock(&self, key: &str) -> KeyLock<'_> {
        let mutex = self.locks.entry(key.to_string()).or_default().clone();
        KeyLock {
            locks: &self.locks,
            key: key.to_string(),
            guard: Some(mutex.lock_owned().await),
        }
    }

    fn load(&self, key: &str) -> Result<Option<Transaction>, TransactionError> {
        match self.store.get(NS_BUILD_TRANSACTIONS, key.as_bytes())? {
            Some(bytes) => Transaction::from_bytes(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn require(&self, key: &str) -> Result<Transaction, TransactionError> {
        self.load(key)?
            .ok_or_else(|| TransactionError::UnknownTransaction(key.to_string()))
    }

    fn save(&self, key: &str, tx: &Transaction) -> Result<(), TransactionError> {
        let bytes = tx.to_bytes()?;
        self.store
            .put(NS_BUILD_TRANSACTIONS, key.as_bytes(), Some(&bytes))?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), TransactionError> {
        self.store.put(NS_BUILD_TRANSACTIONS, key.as_bytes(), None)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Opens an empty transaction under `key`, stamped with the current time.
    pub async fn start(&self, key: &str) -> Result<Transaction, TransactionError> {
        check_key(key)?;
        let _guard = self.lock(key).await;
        if self.load(key)?.is_some() {
            return Err(TransactionError::DuplicateKey(key.to_string()));
        }

        let tx = Transaction::new(now_millis());
        self.save(key, &tx)?;
        info!(key, "transaction started");
        Ok(tx)
    }

    pub async fn add_input(
        &self,
        key: &str,
        from: &AddressRef,
        amount: &str,
    ) -> Result<Transaction, TransactionError> {
        self.add(key, Slot::Input, from, amount).await
    }

    pub async fn add_output(
        &self,
        key: &str,
        to: &AddressRef,
        amount: &str,
    ) -> Result<Transaction, TransactionError> {
        self.add(key, Slot::Output, to, amount).await
    }

    pub async fn add_ec_output(
        &self,
        key: &str,
        to: &AddressRef,
        amount: &str,
    ) -> Result<Transaction, TransactionError> {
        self.add(key, Slot::EcOutput, to, amount).await
    }

    async fn add(
        &self,
        key: &str,
        slot: Slot,
        reference: &AddressRef,
        amount: &str,
    ) -> Result<Transaction, TransactionError> {
        let _guard = self.lock(key).await;
        let mut tx = self.require(key)?;

        let address = self.resolve_address(slot.kind(), reference)?;
        let amount = parse_fixed_point(amount)?;
        let io = TxAddress::new(address, amount);
        match slot {
            Slot::Input => tx.inputs.push(io),
            Slot::Output => tx.outputs.push(io),
            Slot::EcOutput => tx.ec_outputs.push(io),
        }

        self.save(key, &tx)?;
        debug!(key, ?slot, amount, "added to transaction");
        Ok(tx)
    }

    fn resolve_address(
        &self,
        kind: AddressKind,
        reference: &AddressRef,
    ) -> Result<Address, TransactionError> {
        let name = match reference {
            AddressRef::Literal(address) | AddressRef::Hex(address) => return Ok(*address),
            AddressRef::Name(name) => name,
        };
        let entry = self
            .credentials
            .get_by_name(name)?
            .ok_or_else(|| TransactionError::NameUndefined(name.clone()))?;
        if entry.kind() != kind {
            return Err(TransactionError::WrongKind {
                name: name.clone(),
                expected: kind,
            });
        }
        Ok(entry.address()?)
    }

    /// Validates the balance, then signs every input with the credential
    /// that owns its address. Replaces any earlier signatures.
    pub async fn sign(&self, key: &str) -> Result<Transaction, TransactionError> {
        let _guard = self.lock(key).await;
        let mut tx = self.require(key)?;
        validate(&tx, self.ec_rate)?;

        let message = tx.signable_bytes()?;
        let mut auths = Vec::with_capacity(tx.inputs.len());
        for (index, input) in tx.inputs.iter().enumerate() {
            let missing = || TransactionError::MissingCredential {
                index,
                address: input.address.to_user_string(AddressKind::Factoid),
            };
            let entry = self
                .credentials
                .get_by_address(&input.address)?
                .ok_or_else(missing)?;
            let rcd = *entry.rcd().ok_or(EntryError::MissingRcd)?;
            if entry.kind() != AddressKind::Factoid || rcd.address() != input.address {
                return Err(missing());
            }
            auths.push(AuthBlock {
                rcd,
                signatures: vec![entry.sign(&message)?],
            });
        }
        tx.auths = auths;

        self.save(key, &tx)?;
        info!(key, txid = %tx.txid()?, "transaction signed");
        Ok(tx)
    }

    /// Validates, relays, and clears the staged transaction.
    ///
    /// A local validation failure leaves the transaction in place. Once
    /// validation passes the key is cleared whatever the node answers,
    /// including when the relay itself fails.
    pub async fn submit(&self, key: &str) -> Result<Submission, TransactionError> {
        let _guard = self.lock(key).await;
        let tx = self.require(key)?;
        validate(&tx, self.ec_rate)?;
        validate_signatures(&tx)?;

        let txid = tx.txid()?;
        let body = json!({ "Transaction": hex::encode(tx.to_bytes()?) });
        let relay = self.node.post_json(PATH_FACTOID_SUBMIT, body).await;
        self.clear(key)?;

        let outcome = relay?;
        if outcome.is_success() {
            info!(key, %txid, "transaction submitted");
        } else {
            warn!(key, %txid, status = outcome.status, "node refused transaction");
        }
        Ok(Submission { txid, outcome })
    }

    /// Drops a staged transaction without relaying it.
    pub async fn delete(&self, key: &str) -> Result<(), TransactionError> {
        let _guard = self.lock(key).await;
        self.require(key)?;
        self.clear(key)?;
        info!(key, "transaction deleted");
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Transaction>, TransactionError> {
        let _guard = self.lock(key).await;
        self.load(key)
    }

    /// Keys of all staged transactions, sorted.
    pub fn keys(&self) -> Result<Vec<String>, TransactionError> {
        Ok(self
            .store
            .keys(NS_BUILD_TRANSACTIONS)?
            .into_iter()
            .map(|k| String::from_utf8_lossy(&k).into_owned())
            .collect())
    }
}

/// Holds one key's mutex. On release the map entry is dropped unless
/// another caller is already waiting on it.
struct KeyLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

fn check_key(key: &str) -> Result<(), TransactionError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH || key.chars().any(char::is_whitespace) {
        return Err(TransactionError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

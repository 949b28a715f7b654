//! Incremental directory-block scanner.

use std::sync::Arc;

use tracing::{debug, info};

use super::blocks::{DirectoryBlock, FactoidBlock};
use super::ScanError;
use crate::address::Address;
use crate::crypto::Hash;
use crate::node::NodeClient;
use crate::storage::{KeyValueStore, StoreError, NS_SCANNER};
use crate::transaction::Transaction;

const CHECKPOINT_KEY: &[u8] = b"last-processed";

/// Called once per newly discovered factoid block, oldest first.
pub trait BlockHook: Send + Sync {
    fn on_factoid_block(&mut self, block: &FactoidBlock) -> Result<(), ScanError>;
}

/// The default hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl BlockHook for NoopHook {
    fn on_factoid_block(&mut self, _block: &FactoidBlock) -> Result<(), ScanError> {
        Ok(())
    }
}

/// What a refresh found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// The node's head is the block already processed.
    Unchanged,
    /// This many directory blocks were added.
    Advanced(usize),
}

/// One node's view of the factoid chain, accumulated oldest first.
///
/// Every method that talks to the node takes `&mut self`, so one instance
/// never runs two refresh cycles at once. Share it behind a
/// `tokio::sync::Mutex` if several tasks need it.
pub struct HistoryScanner {
    node: Arc<dyn NodeClient>,
    hook: Box<dyn BlockHook>,
    head: Hash,
    last_processed: Hash,
    directory_blocks: Vec<DirectoryBlock>,
    factoid_blocks: Vec<FactoidBlock>,
}

impl HistoryScanner {
    /// A scanner that starts from genesis.
    pub fn new(node: Arc<dyn NodeClient>) -> Self {
        Self::with_checkpoint(node, Hash::ZERO)
    }

    /// A scanner that treats `last_tip` as already processed.
    pub fn with_checkpoint(node: Arc<dyn NodeClient>, last_tip: Hash) -> Self {
        Self {
            node,
            hook: Box::new(NoopHook),
            head: last_tip,
            last_processed: last_tip,
            directory_blocks: Vec::new(),
            factoid_blocks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl BlockHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    /// Tip of the last completed walk.
    pub fn checkpoint(&self) -> Hash {
        self.last_processed
    }

    /// Latest tip reported by the node.
    pub fn head(&self) -> Hash {
        self.head
    }

    pub fn directory_blocks(&self) -> &[DirectoryBlock] {
        &self.directory_blocks
    }

    pub fn factoid_blocks(&self) -> &[FactoidBlock] {
        &self.factoid_blocks
    }

    /// Asks the node for its head and walks back to the checkpoint if it
    /// moved.
    pub async fn refresh_head(&mut self) -> Result<Refresh, ScanError> {
        let head = self.node.directory_block_head().await?;
        if head == self.last_processed {
            debug!(%head, "head unchanged");
            return Ok(Refresh::Unchanged);
        }
        self.head = head;
        let added = self.walk().await?;
        Ok(Refresh::Advanced(added))
    }

    /// Fetches every directory block between the recorded head and the
    /// checkpoint, then replays them oldest first.
    ///
    /// Nothing is committed unless the whole walk succeeds; a failed walk
    /// can simply be retried.
    pub async fn walk(&mut self) -> Result<usize, ScanError> {
        if self.head == self.last_processed {
            return Ok(0);
        }

        let mut pending = Vec::new();
        let mut next = self.head;
        loop {
            let raw = self.node.get_raw(&next).await?;
            let block = DirectoryBlock::from_bytes(&raw)?;
            check_height_step(pending.last(), &block)?;

            let prev = block.header.prev_key_mr;
            let height = block.header.height;
            pending.push(block);

            if prev == self.last_processed {
                break;
            }
            if prev.is_zero() || height == 0 {
                return Err(ScanError::Integrity(format!(
                    "reached genesis without finding checkpoint {}",
                    self.last_processed
                )));
            }
            next = prev;
        }

        let mut fresh = Vec::with_capacity(pending.len());
        for dblock in pending.into_iter().rev() {
            let key_mr = dblock.factoid_block_key_mr()?;
            let raw = self.node.get_raw(&key_mr).await?;
            let fblock = FactoidBlock::from_bytes(&raw)?;
            debug!(
                height = dblock.header.height,
                transactions = fblock.transactions.len(),
                "factoid block fetched"
            );
            fresh.push((dblock, fblock));
        }

        for (_, fblock) in &fresh {
            self.hook.on_factoid_block(fblock)?;
        }

        let added = fresh.len();
        for (dblock, fblock) in fresh {
            self.directory_blocks.push(dblock);
            self.factoid_blocks.push(fblock);
        }
        self.last_processed = self.head;
        info!(added, head = %self.head, "history advanced");
        Ok(added)
    }

    /// Refreshes, then renders every non-coinbase transaction that involves
    /// one of `addresses` (or every one, if `addresses` is empty).
    ///
    /// Transactions are numbered by a counter that runs across the whole
    /// report and counts filtered-out transactions too.
    pub async fn dump_transactions(&mut self, addresses: &[Address]) -> Result<String, ScanError> {
        self.refresh_head().await?;
        Ok(render_transactions(&self.factoid_blocks, addresses))
    }
}

/// A block walked back from `newer` must sit exactly one height below it.
fn check_height_step(
    newer: Option<&DirectoryBlock>,
    older: &DirectoryBlock,
) -> Result<(), ScanError> {
    let Some(newer) = newer else {
        return Ok(());
    };
    if newer.header.height.checked_sub(1) != Some(older.header.height) {
        return Err(ScanError::Integrity(format!(
            "directory block at height {} points back to height {}",
            newer.header.height, older.header.height
        )));
    }
    Ok(())
}

/// Whether `tx` touches any of `addresses`. An empty set matches everything.
pub fn filter_transaction(tx: &Transaction, addresses: &[Address]) -> bool {
    addresses.is_empty() || addresses.iter().any(|a| tx.involves(a))
}

fn render_transactions(blocks: &[FactoidBlock], addresses: &[Address]) -> String {
    let mut report = String::new();
    let mut counter = 1usize;
    for block in blocks {
        if block.transactions.len() <= 1 {
            continue;
        }
        let mut section = format!("Transactions at block height {}\n", block.height);
        let mut wrote = false;
        for tx in &block.transactions[1..] {
            if filter_transaction(tx, addresses) {
                section.push_str(&format!("Transaction {counter}\n{tx}\n"));
                wrote = true;
            }
            counter += 1;
        }
        if wrote {
            report.push_str(&section);
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Checkpoint persistence
// ---------------------------------------------------------------------------

pub fn save_checkpoint(store: &dyn KeyValueStore, tip: &Hash) -> Result<(), ScanError> {
    store.put(NS_SCANNER, CHECKPOINT_KEY, Some(tip.as_bytes()))?;
    Ok(())
}

pub fn load_checkpoint(store: &dyn KeyValueStore) -> Result<Option<Hash>, ScanError> {
    match store.get(NS_SCANNER, CHECKPOINT_KEY)? {
        Some(bytes) => Hash::from_slice(&bytes).map(Some).map_err(|_| {
            ScanError::Store(StoreError::Corrupt {
                namespace: NS_SCANNER.to_string(),
                reason: format!("checkpoint is {} bytes, expected 32", bytes.len()),
            })
        }),
        None => Ok(None),
    }
}

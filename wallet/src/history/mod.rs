//! # History Scanner
//!
//! Follows the node's directory-block chain backward from its head to the
//! last block already seen, then replays the new blocks oldest first and
//! collects their factoid blocks.
//!
//! ```text
//! head ──prev──▶ D(n-1) ──prev──▶ ... ──prev──▶ checkpoint
//!   │              │
//!   ▼              ▼
//!  F(n)          F(n-1)      one factoid block per directory block
//! ```
//!
//! Decoded blocks come from the network and are untrusted: structural
//! problems surface as [`ScanError::Malformed`] or [`ScanError::Integrity`],
//! never as a panic.

pub mod blocks;
pub mod scanner;

pub use blocks::{DirectoryBlock, DirectoryEntry, DirectoryHeader, FactoidBlock};
pub use scanner::{
    filter_transaction, load_checkpoint, save_checkpoint, BlockHook, HistoryScanner, NoopHook,
    Refresh,
};

use thiserror::Error;

use crate::codec::DecodeError;
use crate::node::NodeError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("malformed block: {0}")]
    Malformed(String),

    #[error("chain integrity violation: {0}")]
    Integrity(String),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("block hook failed: {0}")]
    Hook(String),
}

impl From<DecodeError> for ScanError {
    fn from(err: DecodeError) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl ScanError {
    /// The node served data that cannot be right. Retrying will not help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Integrity(_))
    }
}

//! # Credentials
//!
//! Signing credentials and their persistent index.
//!
//! ```text
//! rcd.rs   : Rcd: the spending condition behind a factoid address
//! entry.rs : WalletEntry: name + kind + RCD + key pairs, binary codec
//! store.rs : CredentialStore: lookup by name or address over a KeyValueStore
//! ```
//!
//! Every entry is stored twice, once under its name and once under its
//! derived address, so both lookups are a single `get`.

pub mod entry;
pub mod rcd;
pub mod store;

pub use entry::WalletEntry;
pub use rcd::{Rcd, RCD_TYPE_SINGLE};
pub use store::CredentialStore;

use thiserror::Error;

use crate::codec::DecodeError;
use crate::crypto::KeyError;
use crate::storage::StoreError;

/// Errors from building, decoding, or storing credentials.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("truncated credential record: {0}")]
    Truncated(#[from] DecodeError),

    #[error("invalid address kind byte {0}")]
    InvalidKind(u8),

    #[error("unknown RCD type {0:#04x}")]
    UnknownRcdType(u8),

    #[error("{0} trailing bytes after credential record")]
    TrailingBytes(usize),

    #[error("public and private key counts differ ({public} vs {private})")]
    KeyCountMismatch { public: usize, private: usize },

    #[error("name of {0} bytes does not fit the record")]
    NameTooLong(usize),

    #[error("{0} keys do not fit the record")]
    TooManyKeys(usize),

    #[error("credential has no spending condition")]
    MissingRcd,

    #[error("credential has no public key")]
    NoPublicKey,

    #[error("credential has no private key")]
    NoPrivateKey,

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("invalid name '{0}'")]
    InvalidName(String),

    #[error("duplicate name '{0}'")]
    DuplicateName(String),

    #[error("address {0} is already in the wallet")]
    DuplicateAddress(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EntryError {
    /// Errors that mean a record or remote payload is corrupt, as opposed to
    /// a bad request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownRcdType(_)
                | Self::Truncated(_)
                | Self::InvalidKind(_)
                | Self::TrailingBytes(_)
                | Self::KeyCountMismatch { .. }
        )
    }
}

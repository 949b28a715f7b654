//! # Transactions
//!
//! The factoid transaction model and the staging area transactions are
//! built in.
//!
//! ```text
//! types.rs      : Transaction, TxAddress, AuthBlock, binary codec, txid
//! fee.rs        : minimum fee from size, outputs, and inputs
//! validation.rs : balance checks and signature checks
//! builder.rs    : TransactionBuilder: keyed staged transactions
//! ```

pub mod builder;
pub mod fee;
pub mod types;
pub mod validation;

pub use builder::{Submission, TransactionBuilder};
pub use fee::minimum_fee;
pub use types::{AuthBlock, Transaction, TxAddress};
pub use validation::{validate, validate_signatures};

use thiserror::Error;

use crate::address::{AddressError, AddressKind, AmountError};
use crate::codec::DecodeError;
use crate::credential::EntryError;
use crate::node::NodeError;
use crate::storage::StoreError;

/// Errors from building, validating, signing, or submitting transactions.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Unknown Transaction '{0}'")]
    UnknownTransaction(String),

    #[error("duplicate transaction key '{0}'")]
    DuplicateKey(String),

    #[error("invalid transaction key '{0}'")]
    InvalidKey(String),

    #[error("Name is undefined: '{0}'")]
    NameUndefined(String),

    #[error("'{name}' is the wrong kind of credential, expected {expected}")]
    WrongKind { name: String, expected: AddressKind },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("transaction has no inputs")]
    NoInputs,

    #[error("insufficient fee: inputs {inputs} < outputs {outputs} + fee {fee}")]
    InsufficientFee { inputs: u64, outputs: u64, fee: u64 },

    #[error("amount overflow")]
    AmountOverflow,

    #[error("too many entries ({0}, max 255)")]
    TooManyEntries(usize),

    #[error("input {index} is not signed")]
    MissingSignature { index: usize },

    #[error("input {index} is signed by a condition for another address")]
    RcdMismatch { index: usize },

    #[error("input {index} has an invalid signature")]
    InvalidSignature { index: usize },

    #[error("no credential in the wallet for input {index} ({address})")]
    MissingCredential { index: usize, address: String },

    #[error("malformed transaction: {0}")]
    Malformed(String),

    #[error(transparent)]
    Credential(#[from] EntryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Node(#[from] NodeError),
}

impl From<DecodeError> for TransactionError {
    fn from(err: DecodeError) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl TransactionError {
    /// Balance and signature failures, as opposed to bad input or I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoInputs
                | Self::InsufficientFee { .. }
                | Self::AmountOverflow
                | Self::MissingSignature { .. }
                | Self::RcdMismatch { .. }
                | Self::InvalidSignature { .. }
        )
    }
}

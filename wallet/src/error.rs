//! Crate-wide error type.
//!
//! Each module has its own error enum; [`WalletError`] gathers them for
//! callers that drive several modules at once, such as the CLI.

use thiserror::Error;

use crate::address::{AddressError, AmountError};
use crate::commit::CommitError;
use crate::credential::EntryError;
use crate::history::ScanError;
use crate::node::NodeError;
use crate::storage::StoreError;
use crate::transaction::TransactionError;

#[derive(Debug, Error)]
pub enum WalletError {
    /// The caller asked for something malformed or unresolvable.
    #[error("invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Credential(#[from] EntryError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AddressError> for WalletError {
    fn from(err: AddressError) -> Self {
        Self::Input(err.to_string())
    }
}

impl From<AmountError> for WalletError {
    fn from(err: AmountError) -> Self {
        Self::Input(err.to_string())
    }
}

impl WalletError {
    /// Corrupt data from the node or the store. A long-running caller should
    /// stop trusting that source rather than retry.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Scan(e) => e.is_fatal(),
            Self::Credential(e) => e.is_fatal(),
            Self::Transaction(TransactionError::Credential(e)) => e.is_fatal(),
            Self::Transaction(TransactionError::Malformed(_)) => true,
            Self::Commit(CommitError::Credential(e)) => e.is_fatal(),
            _ => false,
        }
    }

    /// Network failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Node(e)
            | Self::Transaction(TransactionError::Node(e))
            | Self::Commit(CommitError::Node(e))
            | Self::Scan(ScanError::Node(e)) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeError;

    #[test]
    fn integrity_errors_are_fatal() {
        let err: WalletError = ScanError::Integrity("two factoid blocks".into()).into();
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn unknown_rcd_type_is_fatal() {
        let err: WalletError = EntryError::UnknownRcdType(9).into();
        assert!(err.is_fatal());
        let nested: WalletError = TransactionError::Credential(EntryError::Truncated(
            DecodeError::UnexpectedEof {
                needed: 1,
                remaining: 0,
            },
        ))
        .into();
        assert!(nested.is_fatal());
    }

    #[test]
    fn timeouts_are_retryable_wherever_they_surface() {
        let direct: WalletError = NodeError::Timeout("/v1/x".into()).into();
        let via_submit: WalletError =
            TransactionError::Node(NodeError::Transport("reset".into())).into();
        assert!(direct.is_retryable());
        assert!(via_submit.is_retryable());
        assert!(!direct.is_fatal());
    }

    #[test]
    fn bad_caller_input_is_neither() {
        let err: WalletError = AmountError::Empty.into();
        assert!(matches!(err, WalletError::Input(_)));
        assert!(!err.is_fatal() && !err.is_retryable());
    }
}

//! # Commit Signing
//!
//! Signs chain and entry commits with an entry-credit credential and relays
//! them to the node. Nothing is stored locally.
//!
//! ```text
//! {"Message": hex(msg)}
//!        │ decode
//!        ▼
//!  msg ‖ public_key(32) ‖ sign(msg)(64)
//!        │ hex
//!        ▼
//! {"CommitChainMsg": ...}  → POST /v1/commit-chain
//! {"CommitEntryMsg": ...}  → POST /v1/commit-entry/
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::address::{AddressError, AddressKind, AddressRef};
use crate::config::{PATH_COMMIT_CHAIN, PATH_COMMIT_ENTRY};
use crate::credential::{CredentialStore, EntryError, WalletEntry};
use crate::node::{NodeClient, NodeError, RelayOutcome};

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("could not parse commit request: {0}")]
    InvalidRequest(String),

    #[error("could not decode message: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Unknown address '{0}'")]
    UnknownAddress(String),

    #[error("'{0}' is not an entry credit credential")]
    NotEntryCredit(String),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Credential(#[from] EntryError),

    #[error(transparent)]
    Node(#[from] NodeError),
}

/// The JSON a caller hands in: the unsigned commit, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    #[serde(rename = "Message")]
    pub message: String,
}

impl CommitRequest {
    pub fn from_json(json: &str) -> Result<Self, CommitError> {
        serde_json::from_str(json).map_err(|e| CommitError::InvalidRequest(e.to_string()))
    }

    pub fn from_message(message: &[u8]) -> Self {
        Self {
            message: hex::encode(message),
        }
    }

    fn decode(&self) -> Result<Vec<u8>, CommitError> {
        Ok(hex::decode(&self.message)?)
    }
}

/// Signs commits and relays them to a node.
pub struct CommitSigner {
    credentials: CredentialStore,
    node: Arc<dyn NodeClient>,
}

impl CommitSigner {
    pub fn new(credentials: CredentialStore, node: Arc<dyn NodeClient>) -> Self {
        Self { credentials, node }
    }

    /// Commits a new chain, paid by the credential `payer` points at.
    pub async fn commit_chain(
        &self,
        payer: &AddressRef,
        request: &CommitRequest,
    ) -> Result<RelayOutcome, CommitError> {
        let message = request.decode()?;
        let label = describe(payer);
        let entry = self
            .credentials
            .resolve(payer)?
            .ok_or_else(|| CommitError::UnknownAddress(label.clone()))?;

        let payload = signed_payload(&entry, &label, &message)?;
        let body = json!({ "CommitChainMsg": hex::encode(payload) });
        let outcome = self.relay(PATH_COMMIT_CHAIN, body).await?;
        info!(payer = %label, "chain commit relayed");
        Ok(outcome)
    }

    /// Commits an entry, paid by the credential called `name`.
    pub async fn commit_entry(
        &self,
        name: &str,
        request: &CommitRequest,
    ) -> Result<RelayOutcome, CommitError> {
        let message = request.decode()?;
        let reference = AddressRef::name(name)?;
        let entry = self
            .credentials
            .resolve(&reference)?
            .ok_or_else(|| CommitError::UnknownAddress(name.to_string()))?;

        let payload = signed_payload(&entry, name, &message)?;
        let body = json!({ "CommitEntryMsg": hex::encode(payload) });
        let outcome = self.relay(PATH_COMMIT_ENTRY, body).await?;
        info!(payer = name, "entry commit relayed");
        Ok(outcome)
    }

    async fn relay(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<RelayOutcome, CommitError> {
        let outcome = self.node.post_json(path, body).await?;
        if !outcome.is_success() {
            return Err(NodeError::Rejected {
                status: outcome.status,
            }
            .into());
        }
        Ok(outcome)
    }
}

/// `message ‖ public_key ‖ signature(message)`.
fn signed_payload(
    entry: &WalletEntry,
    label: &str,
    message: &[u8],
) -> Result<Vec<u8>, CommitError> {
    if entry.kind() != AddressKind::EntryCredit {
        return Err(CommitError::NotEntryCredit(label.to_string()));
    }
    let keypair = entry.keypair()?;
    let signature = keypair.sign(message);

    let mut payload = Vec::with_capacity(message.len() + 96);
    payload.extend_from_slice(message);
    payload.extend_from_slice(&keypair.public_key_bytes());
    payload.extend_from_slice(signature.as_bytes());
    Ok(payload)
}

fn describe(reference: &AddressRef) -> String {
    match reference {
        AddressRef::Literal(address) => address.to_user_string(AddressKind::EntryCredit),
        AddressRef::Hex(address) => address.to_hex(),
        AddressRef::Name(name) => name.clone(),
    }
}

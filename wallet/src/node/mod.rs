//! # Node Client
//!
//! Everything the wallet needs from a node, as one async trait.
//!
//! ```text
//! mod.rs  : NodeClient trait, NodeError, RelayOutcome
//! http.rs : HttpNodeClient: reqwest against the node's REST API
//! mock.rs : MockNode: in-memory node for tests (`test-util` feature)
//! ```
//!
//! Reads (`directory_block_head`, `get_raw`) fail on any non-2xx status.
//! Writes (`post_json`) hand the status back in a [`RelayOutcome`] and let
//! the caller decide what a refusal means.

pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use http::HttpNodeClient;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockNode;

use async_trait::async_trait;
use thiserror::Error;

use crate::crypto::Hash;

/// Errors talking to the node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("node answered {status} for {path}")]
    Status { status: u16, path: String },

    #[error("node rejected the request with status {status}")]
    Rejected { status: u16 },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl NodeError {
    /// Failures where the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

/// What the node said to a POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub status: u16,
    pub body: String,
}

impl RelayOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A node the wallet reads blocks from and relays messages to.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// KeyMR of the newest directory block.
    async fn directory_block_head(&self) -> Result<Hash, NodeError>;

    /// Raw bytes of the block with the given KeyMR. Used for directory and
    /// factoid blocks alike.
    async fn get_raw(&self, hash: &Hash) -> Result<Vec<u8>, NodeError>;

    /// POSTs a JSON body to `path`. The body is drained before returning.
    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<RelayOutcome, NodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_failures_are_retryable() {
        assert!(NodeError::Transport("reset".into()).is_retryable());
        assert!(NodeError::Timeout("/v1/x".into()).is_retryable());
        assert!(!NodeError::Rejected { status: 400 }.is_retryable());
        assert!(!NodeError::Decode("bad".into()).is_retryable());
    }

    #[test]
    fn outcome_success_is_2xx() {
        let ok = RelayOutcome {
            status: 201,
            body: String::new(),
        };
        let refused = RelayOutcome {
            status: 400,
            body: "bad".into(),
        };
        assert!(ok.is_success());
        assert!(!refused.is_success());
    }
}

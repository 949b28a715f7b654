//! In-memory node.
//!
//! Serves blocks from a map, records every POST, and counts fetches so tests
//! can assert exactly how much traffic an operation caused.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{NodeClient, NodeError, RelayOutcome};
use crate::crypto::Hash;

/// A recorded POST.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    pub path: String,
    pub body: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct MockNode {
    head: Mutex<Hash>,
    blocks: Mutex<HashMap<Hash, Vec<u8>>>,
    posts: Mutex<Vec<PostedMessage>>,
    post_status: Mutex<Option<u16>>,
    fail_posts: Mutex<bool>,
    head_fetches: AtomicUsize,
    raw_fetches: AtomicUsize,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_head(&self, head: Hash) {
        *self.head.lock() = head;
    }

    pub fn insert_block(&self, hash: Hash, bytes: Vec<u8>) {
        self.blocks.lock().insert(hash, bytes);
    }

    /// Status every later POST answers with. Defaults to 200.
    pub fn set_post_status(&self, status: u16) {
        *self.post_status.lock() = Some(status);
    }

    /// Makes every later POST fail with a transport error.
    pub fn fail_posts(&self) {
        *self.fail_posts.lock() = true;
    }

    pub fn posts(&self) -> Vec<PostedMessage> {
        self.posts.lock().clone()
    }

    pub fn head_fetches(&self) -> usize {
        self.head_fetches.load(Ordering::SeqCst)
    }

    pub fn raw_fetches(&self) -> usize {
        self.raw_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn directory_block_head(&self) -> Result<Hash, NodeError> {
        self.head_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(*self.head.lock())
    }

    async fn get_raw(&self, hash: &Hash) -> Result<Vec<u8>, NodeError> {
        self.raw_fetches.fetch_add(1, Ordering::SeqCst);
        self.blocks
            .lock()
            .get(hash)
            .cloned()
            .ok_or_else(|| NodeError::Status {
                status: 404,
                path: hash.to_hex(),
            })
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<RelayOutcome, NodeError> {
        self.posts.lock().push(PostedMessage {
            path: path.to_string(),
            body,
        });
        if *self.fail_posts.lock() {
            return Err(NodeError::Transport("connection refused".into()));
        }
        Ok(RelayOutcome {
            status: self.post_status.lock().unwrap_or(200),
            body: String::new(),
        })
    }
}

// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Factoid Wallet: Core Library
//!
//! A wallet controller for a Factoid-style ledger: it holds signing
//! credentials, stages and signs transactions, signs chain and entry
//! commits, and scans directory-block history for activity on a set of
//! addresses. Everything it cannot do locally it relays to a node over HTTP.
//!
//! ## Architecture
//!
//! - **config**: Fixed lengths, endpoint paths, and runtime settings.
//! - **crypto**: SHA-256 hashing and Ed25519 keys.
//! - **address**: Addresses, their string form, and decimal amounts.
//! - **storage**: The namespaced key-value store all state lives in.
//! - **credential**: Spending conditions, credentials, and their index.
//! - **transaction**: The transaction model and the staged builder.
//! - **commit**: Chain and entry commit signing.
//! - **node**: The node client trait and its HTTP implementation.
//! - **history**: Block codecs and the incremental history scanner.
//! - **error**: The crate-wide error type.
//!
//! Credentials and transactions are the only state the wallet owns, and both
//! go through [`storage::KeyValueStore`], so a wallet directory can be
//! reopened by the next process without any in-memory handoff.

pub mod address;
pub mod codec;
pub mod commit;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod history;
pub mod node;
pub mod storage;
pub mod transaction;

pub use error::{WalletError, WalletResult};

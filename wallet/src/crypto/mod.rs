//! # Cryptographic Primitives
//!
//! Thin wrappers over audited crates:
//!
//! - **Ed25519** (`ed25519-dalek`) for credential signatures.
//! - **SHA-256** (`sha2`) for transaction ids and address derivation.
//!
//! Nothing in here is novel. If a function looks clever, it is a bug.

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, sha256, Hash, InvalidHash};
pub use keys::{verify_signature, KeyError, Keypair, Signature};

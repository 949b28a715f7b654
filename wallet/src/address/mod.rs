//! # Addresses
//!
//! Raw 32-byte addresses, the two address kinds, and their human-facing
//! string form.
//!
//! ```text
//! mod.rs       : Address, AddressKind, user-string encode/decode
//! amount.rs    : fixed-point decimal amounts <-> factoshis
//! reference.rs : AddressRef: literal address, hex literal, or credential name
//! ```
//!
//! ## String format
//!
//! A user-facing address is Base58Check over `prefix(2) ‖ address(32)`, with
//! the 4-byte double-SHA-256 checksum appended by `bs58`. The prefix pins
//! the kind, so an entry-credit string never decodes as a factoid address.
//! The encoding itself is delegated entirely to `bs58`.

pub mod amount;
pub mod reference;

pub use amount::{format_fixed_point, parse_fixed_point, AmountError};
pub use reference::AddressRef;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;

/// Version prefix of factoid address strings (render as `FA...`).
pub const FACTOID_PREFIX: [u8; 2] = [0x5f, 0xb1];

/// Version prefix of entry-credit address strings (render as `EC...`).
pub const ENTRY_CREDIT_PREFIX: [u8; 2] = [0x59, 0x2a];

/// Errors from parsing addresses and address references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("not a valid {kind} address string")]
    InvalidUserString { kind: AddressKind },

    #[error("invalid hex address: {0}")]
    InvalidHex(String),

    #[error("invalid name: name is too long ({len} characters, max {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("address must be 32 bytes, got {0}")]
    WrongLength(usize),
}

// ---------------------------------------------------------------------------
// AddressKind
// ---------------------------------------------------------------------------

/// Which ledger an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    /// Ordinary currency address, derived from a spending condition.
    Factoid,
    /// Entry-credit address, which is the public key itself.
    EntryCredit,
}

impl AddressKind {
    /// The byte this kind is stored as in a credential record.
    pub fn wire_byte(self) -> u8 {
        match self {
            Self::Factoid => 0,
            Self::EntryCredit => 1,
        }
    }

    pub fn from_wire_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Factoid),
            1 => Some(Self::EntryCredit),
            _ => None,
        }
    }

    fn prefix(self) -> [u8; 2] {
        match self {
            Self::Factoid => FACTOID_PREFIX,
            Self::EntryCredit => ENTRY_CREDIT_PREFIX,
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factoid => write!(f, "factoid"),
            Self::EntryCredit => write!(f, "entry credit"),
        }
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A raw 32-byte address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; ADDRESS_LENGTH] = slice
            .try_into()
            .map_err(|_| AddressError::WrongLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Decodes exactly 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Human-facing string for this address under the given kind.
    pub fn to_user_string(&self, kind: AddressKind) -> String {
        encode_user_address(kind, self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// User strings
// ---------------------------------------------------------------------------

/// Encodes an address as a Base58Check string with the kind's prefix.
pub fn encode_user_address(kind: AddressKind, address: &Address) -> String {
    let mut payload = Vec::with_capacity(2 + ADDRESS_LENGTH);
    payload.extend_from_slice(&kind.prefix());
    payload.extend_from_slice(address.as_bytes());
    bs58::encode(payload).with_check().into_string()
}

/// Decodes a user string, requiring a valid checksum and the kind's prefix.
pub fn decode_user_address(kind: AddressKind, s: &str) -> Result<Address, AddressError> {
    let invalid = || AddressError::InvalidUserString { kind };
    let payload = bs58::decode(s)
        .with_check(None)
        .into_vec()
        .map_err(|_| invalid())?;
    if payload.len() != 2 + ADDRESS_LENGTH || payload[..2] != kind.prefix() {
        return Err(invalid());
    }
    Address::from_slice(&payload[2..]).map_err(|_| invalid())
}

/// `true` if `s` is a well-formed address string of the given kind.
pub fn is_valid_user_address(kind: AddressKind, s: &str) -> bool {
    decode_user_address(kind, s).is_ok()
}

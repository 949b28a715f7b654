//! Caller-supplied references to an address.
//!
//! Commands accept "an address" in three shapes: a user-facing address
//! string, a 64-character hex literal, or the name of a credential in the
//! wallet. [`AddressRef`] makes the shape explicit. Callers that know what
//! they have construct the variant directly; [`AddressRef::parse`] keeps the
//! historic sniffing order for bare strings.

use super::{decode_user_address, Address, AddressError, AddressKind};
use crate::config::{ADDRESS_LENGTH, MAX_NAME_LENGTH};

/// A reference to an address, not yet resolved against the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressRef {
    /// A decoded user-facing address string.
    Literal(Address),
    /// A raw address given as hex.
    Hex(Address),
    /// The name of a credential in the wallet.
    Name(String),
}

impl AddressRef {
    /// Classifies a bare string for an address of `kind`.
    ///
    /// Order: a valid address string of `kind`, then exactly 64 characters
    /// as hex (non-hex fails), then a credential name of at most 32 bytes.
    pub fn parse(kind: AddressKind, input: &str) -> Result<Self, AddressError> {
        if let Ok(address) = decode_user_address(kind, input) {
            return Ok(Self::Literal(address));
        }
        if input.len() == ADDRESS_LENGTH * 2 {
            return Address::from_hex(input).map(Self::Hex);
        }
        Self::name(input)
    }

    /// A name reference, enforcing the lookup length limit.
    pub fn name(name: &str) -> Result<Self, AddressError> {
        if name.len() > MAX_NAME_LENGTH {
            return Err(AddressError::NameTooLong {
                len: name.len(),
                max: MAX_NAME_LENGTH,
            });
        }
        Ok(Self::Name(name.to_string()))
    }

    /// A hex reference; fails unless `hex` decodes to 32 bytes.
    pub fn hex(hex: &str) -> Result<Self, AddressError> {
        Address::from_hex(hex).map(Self::Hex)
    }

    /// A literal reference; fails unless `s` is a valid string of `kind`.
    pub fn literal(kind: AddressKind, s: &str) -> Result<Self, AddressError> {
        decode_user_address(kind, s).map(Self::Literal)
    }

    /// The address carried directly, if this is not a name.
    pub fn direct(&self) -> Option<Address> {
        match self {
            Self::Literal(a) | Self::Hex(a) => Some(*a),
            Self::Name(_) => None,
        }
    }
}

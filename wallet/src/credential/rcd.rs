//! Redeem Condition Datastructures (RCDs).
//!
//! An RCD is the spending condition behind a factoid address: the address is
//! the double SHA-256 of the RCD's encoding, and spending requires signatures
//! that satisfy it. The variant set is closed. A new condition type is a new
//! enum variant plus a codec arm.
//!
//! ```text
//! Single:  0x01 ‖ public_key(32)
//! ```

use serde::{Deserialize, Serialize};

use super::EntryError;
use crate::address::Address;
use crate::codec::Reader;
use crate::config::ADDRESS_LENGTH;
use crate::crypto::{double_sha256, verify_signature, Signature};

/// Type byte of the single-key condition.
pub const RCD_TYPE_SINGLE: u8 = 0x01;

/// A spending condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rcd {
    /// Spendable by one Ed25519 signature from `public_key`.
    Single { public_key: [u8; ADDRESS_LENGTH] },
}

impl Rcd {
    pub fn single(public_key: [u8; ADDRESS_LENGTH]) -> Self {
        Self::Single { public_key }
    }

    pub fn type_byte(&self) -> u8 {
        match self {
            Self::Single { .. } => RCD_TYPE_SINGLE,
        }
    }

    /// Number of signatures an authorisation for this condition carries.
    pub fn signatures_required(&self) -> usize {
        match self {
            Self::Single { .. } => 1,
        }
    }

    /// Appends the wire encoding to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.type_byte());
        match self {
            Self::Single { public_key } => buf.extend_from_slice(public_key),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + ADDRESS_LENGTH);
        self.encode_into(&mut buf);
        buf
    }

    /// Reads one RCD, dispatching on its leading type byte.
    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self, EntryError> {
        match reader.read_u8()? {
            RCD_TYPE_SINGLE => Ok(Self::Single {
                public_key: reader.read_hash()?,
            }),
            other => Err(EntryError::UnknownRcdType(other)),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EntryError> {
        Self::decode(&mut Reader::new(bytes))
    }

    /// The factoid address this condition controls.
    pub fn address(&self) -> Address {
        Address::new(double_sha256(&self.to_bytes()))
    }

    /// Whether `signatures` authorise `message` under this condition.
    pub fn verify(&self, message: &[u8], signatures: &[Signature]) -> bool {
        match self {
            Self::Single { public_key } => match signatures {
                [signature] => verify_signature(public_key, message, signature),
                _ => false,
            },
        }
    }

    /// Public keys named by the condition, in order.
    pub fn public_keys(&self) -> Vec<[u8; ADDRESS_LENGTH]> {
        match self {
            Self::Single { public_key } => vec![*public_key],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn single_encoding_is_type_then_key() {
        let rcd = Rcd::single([9u8; 32]);
        let bytes = rcd.to_bytes();
        assert_eq!(bytes.len(), 33);
        assert_eq!(bytes[0], RCD_TYPE_SINGLE);
        assert_eq!(&bytes[1..], &[9u8; 32]);
        assert_eq!(Rcd::from_bytes(&bytes).unwrap(), rcd);
    }

    #[test]
    fn address_is_double_hash_of_encoding() {
        let rcd = Rcd::single([1u8; 32]);
        assert_eq!(rcd.address().as_bytes(), &double_sha256(&rcd.to_bytes()));
    }

    #[test]
    fn unknown_type_byte_is_rejected() {
        let mut bytes = vec![0x07];
        bytes.extend_from_slice(&[0u8; 32]);
        assert!(matches!(
            Rcd::from_bytes(&bytes),
            Err(EntryError::UnknownRcdType(0x07))
        ));
    }

    #[test]
    fn truncated_key_is_rejected() {
        assert!(matches!(
            Rcd::from_bytes(&[RCD_TYPE_SINGLE, 1, 2, 3]),
            Err(EntryError::Truncated(_))
        ));
    }

    #[test]
    fn verify_requires_exactly_one_valid_signature() {
        let kp = Keypair::generate();
        let rcd = Rcd::single(kp.public_key_bytes());
        let sig = kp.sign(b"tx");

        assert!(rcd.verify(b"tx", &[sig]));
        assert!(!rcd.verify(b"other", &[sig]));
        assert!(!rcd.verify(b"tx", &[]));
        assert!(!rcd.verify(b"tx", &[sig, sig]));
    }
}

//! # Key Management
//!
//! Ed25519 key pairs as the wallet stores them.
//!
//! A credential keeps its private material as a 64-byte record: the 32-byte
//! secret scalar followed by the matching 32-byte public key. [`Keypair`]
//! converts between that record and `ed25519-dalek` signing keys, and
//! refuses records whose public half does not match the secret half.
//!
//! Key bytes are never logged from this module.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{ADDRESS_LENGTH, PRIVATE_LENGTH, SECRET_LENGTH, SIGNATURE_LENGTH};

/// Errors that can occur during key operations.
///
/// Intentionally vague about the bytes involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid secret key: expected 32 or 64 bytes, got {0}")]
    InvalidSecretKey(usize),

    #[error("invalid public key: expected 32 bytes, got {0}")]
    InvalidPublicKey(usize),

    #[error("private key record does not match its public key")]
    KeypairMismatch,
}

/// An Ed25519 signing key pair.
///
/// Does not implement `Serialize`; persisting secret material goes through
/// [`Keypair::private_record`] explicitly.
pub struct Keypair {
    signing_key: SigningKey,
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "hex_signature")] [u8; SIGNATURE_LENGTH]);

impl Keypair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Builds a key pair from the 32-byte secret scalar.
    pub fn from_secret(secret: &[u8; SECRET_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Builds a key pair from either a bare 32-byte secret or a 64-byte
    /// `secret ‖ public` record. A record whose public half disagrees with
    /// the secret is rejected.
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            SECRET_LENGTH | PRIVATE_LENGTH => {
                let mut secret = [0u8; SECRET_LENGTH];
                secret.copy_from_slice(&bytes[..SECRET_LENGTH]);
                let keypair = Self::from_secret(&secret);
                if bytes.len() == PRIVATE_LENGTH
                    && bytes[SECRET_LENGTH..] != keypair.public_key_bytes()
                {
                    return Err(KeyError::KeypairMismatch);
                }
                Ok(keypair)
            }
            other => Err(KeyError::InvalidSecretKey(other)),
        }
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; ADDRESS_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Raw secret scalar. Handle with care.
    pub fn secret_bytes(&self) -> [u8; SECRET_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// The stored form of the private key: `secret ‖ public`.
    pub fn private_record(&self) -> [u8; PRIVATE_LENGTH] {
        let mut record = [0u8; PRIVATE_LENGTH];
        record[..SECRET_LENGTH].copy_from_slice(&self.secret_bytes());
        record[SECRET_LENGTH..].copy_from_slice(&self.public_key_bytes());
        record
    }

    /// Sign a message. Ed25519 signing is deterministic.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        verify_signature(&self.public_key_bytes(), message, signature)
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", hex::encode(self.public_key_bytes()))
    }
}

/// Checks `signature` over `message` against a raw public key. Malformed
/// keys simply fail verification.
pub fn verify_signature(
    public_key: &[u8; ADDRESS_LENGTH],
    message: &[u8],
    signature: &Signature,
) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let sig = DalekSignature::from_bytes(&signature.0);
    verifying_key.verify(message, &sig).is_ok()
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

mod hex_signature {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::config::SIGNATURE_LENGTH;

    pub fn serialize<S: Serializer>(bytes: &[u8; SIGNATURE_LENGTH], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; SIGNATURE_LENGTH], D::Error> {
        let text = String::deserialize(d)?;
        let bytes = hex::decode(text).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("signature must be 64 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = Keypair::generate();
        let msg = b"commit chain";
        let sig = kp.sign(msg);
        assert!(kp.verify(msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.verify(b"message", &sig));
    }

    #[test]
    fn private_record_is_secret_then_public() {
        let kp = Keypair::generate();
        let record = kp.private_record();
        assert_eq!(&record[..32], &kp.secret_bytes());
        assert_eq!(&record[32..], &kp.public_key_bytes());
    }

    #[test]
    fn from_private_bytes_accepts_both_shapes() {
        let kp = Keypair::generate();
        let from_secret = Keypair::from_private_bytes(&kp.secret_bytes()).unwrap();
        let from_record = Keypair::from_private_bytes(&kp.private_record()).unwrap();
        assert_eq!(from_secret.public_key_bytes(), kp.public_key_bytes());
        assert_eq!(from_record.public_key_bytes(), kp.public_key_bytes());
    }

    #[test]
    fn from_private_bytes_rejects_mismatched_record() {
        let kp = Keypair::generate();
        let other = Keypair::generate();
        let mut record = kp.private_record();
        record[32..].copy_from_slice(&other.public_key_bytes());
        assert_eq!(
            Keypair::from_private_bytes(&record).unwrap_err(),
            KeyError::KeypairMismatch
        );
    }

    #[test]
    fn from_private_bytes_rejects_wrong_length() {
        assert_eq!(
            Keypair::from_private_bytes(&[7u8; 40]).unwrap_err(),
            KeyError::InvalidSecretKey(40)
        );
    }

    #[test]
    fn deterministic_from_secret() {
        let seed = [42u8; 32];
        let kp1 = Keypair::from_secret(&seed);
        let kp2 = Keypair::from_secret(&seed);
        assert_eq!(kp1.public_key_bytes(), kp2.public_key_bytes());
        assert_eq!(kp1.sign(b"x"), kp2.sign(b"x"));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::from_secret(&[9u8; 32]);
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("Keypair(pub="));
        assert!(!debug_str.contains(&hex::encode(kp.secret_bytes())));
    }

    #[test]
    fn verify_signature_rejects_garbage_key() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"m");
        assert!(!verify_signature(&[0xffu8; 32], b"m", &sig));
    }
}

//! The stored credential: one named key set and its spending condition.
//!
//! ## Wire format
//!
//! ```text
//! kind(1) ‖ name_len(2, BE) ‖ name ‖ rcd ‖ P(1) ‖ P × public(32) ‖ S(1) ‖ S × private(64)
//! ```
//!
//! A private record is the 32-byte secret scalar followed by its public key.
//! The two key lists are parallel: `public_keys[i]` belongs to
//! `private_keys[i]`.

use std::borrow::Cow;
use std::fmt;

use super::{EntryError, Rcd};
use crate::address::{Address, AddressKind};
use crate::codec::Reader;
use crate::config::{ADDRESS_LENGTH, PRIVATE_LENGTH, SECRET_LENGTH};
use crate::crypto::{KeyError, Keypair, Signature};

/// A signing credential.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletEntry {
    kind: AddressKind,
    name: Vec<u8>,
    rcd: Option<Rcd>,
    public_keys: Vec<[u8; ADDRESS_LENGTH]>,
    private_keys: Vec<[u8; PRIVATE_LENGTH]>,
}

impl WalletEntry {
    /// An empty entry with no keys and no spending condition.
    pub fn new(kind: AddressKind, name: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            name: name.into(),
            rcd: None,
            public_keys: Vec::new(),
            private_keys: Vec::new(),
        }
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// The name for display. Names are usually UTF-8 but the format does not
    /// require it.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn set_name(&mut self, name: impl Into<Vec<u8>>) {
        self.name = name.into();
    }

    pub fn rcd(&self) -> Option<&Rcd> {
        self.rcd.as_ref()
    }

    pub fn set_rcd(&mut self, rcd: Rcd) {
        self.rcd = Some(rcd);
    }

    pub fn public_keys(&self) -> &[[u8; ADDRESS_LENGTH]] {
        &self.public_keys
    }

    pub fn private_keys(&self) -> &[[u8; PRIVATE_LENGTH]] {
        &self.private_keys
    }

    /// Adds a key pair and makes it the sole spending condition.
    ///
    /// `private` may be the bare 32-byte secret or a 64-byte record; only the
    /// secret half is kept and the record is rebuilt as `secret ‖ public`.
    /// Any previous condition is replaced by a single-key RCD over `public`.
    pub fn add_key(&mut self, public: &[u8], private: &[u8]) -> Result<(), EntryError> {
        let public: [u8; ADDRESS_LENGTH] = public
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey(public.len()))?;
        if private.len() != SECRET_LENGTH && private.len() != PRIVATE_LENGTH {
            return Err(KeyError::InvalidSecretKey(private.len()).into());
        }

        let mut record = [0u8; PRIVATE_LENGTH];
        record[..SECRET_LENGTH].copy_from_slice(&private[..SECRET_LENGTH]);
        record[SECRET_LENGTH..].copy_from_slice(&public);

        self.public_keys.push(public);
        self.private_keys.push(record);
        self.rcd = Some(Rcd::single(public));
        Ok(())
    }

    /// The address this entry controls.
    ///
    /// Factoid entries take it from the spending condition; entry-credit
    /// entries use the first public key as is.
    pub fn address(&self) -> Result<Address, EntryError> {
        match self.kind {
            AddressKind::Factoid => self
                .rcd
                .as_ref()
                .map(Rcd::address)
                .ok_or(EntryError::MissingRcd),
            AddressKind::EntryCredit => self
                .public_keys
                .first()
                .map(|pk| Address::new(*pk))
                .ok_or(EntryError::NoPublicKey),
        }
    }

    /// Same kind and the same public keys in the same order. Names and
    /// private keys are ignored.
    pub fn matches(&self, other: &WalletEntry) -> bool {
        self.kind == other.kind && self.public_keys == other.public_keys
    }

    /// The key pair behind `private_keys[0]`.
    pub fn keypair(&self) -> Result<Keypair, EntryError> {
        let record = self.private_keys.first().ok_or(EntryError::NoPrivateKey)?;
        Ok(Keypair::from_private_bytes(record)?)
    }

    /// Signs `message` with the first private key.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, EntryError> {
        Ok(self.keypair()?.sign(message))
    }

    // -----------------------------------------------------------------------
    // Codec
    // -----------------------------------------------------------------------

    pub fn to_bytes(&self) -> Result<Vec<u8>, EntryError> {
        let rcd = self.rcd.as_ref().ok_or(EntryError::MissingRcd)?;
        let name_len =
            u16::try_from(self.name.len()).map_err(|_| EntryError::NameTooLong(self.name.len()))?;
        let public_count = u8::try_from(self.public_keys.len())
            .map_err(|_| EntryError::TooManyKeys(self.public_keys.len()))?;
        let private_count = u8::try_from(self.private_keys.len())
            .map_err(|_| EntryError::TooManyKeys(self.private_keys.len()))?;

        let mut buf = Vec::with_capacity(
            4 + self.name.len()
                + ADDRESS_LENGTH * (self.public_keys.len() + 1)
                + PRIVATE_LENGTH * self.private_keys.len()
                + 1,
        );
        buf.push(self.kind.wire_byte());
        buf.extend_from_slice(&name_len.to_be_bytes());
        buf.extend_from_slice(&self.name);
        rcd.encode_into(&mut buf);
        buf.push(public_count);
        for pk in &self.public_keys {
            buf.extend_from_slice(pk);
        }
        buf.push(private_count);
        for sk in &self.private_keys {
            buf.extend_from_slice(sk);
        }
        Ok(buf)
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self, EntryError> {
        let kind_byte = reader.read_u8()?;
        let kind = AddressKind::from_wire_byte(kind_byte).ok_or(EntryError::InvalidKind(kind_byte))?;

        let name_len = reader.read_u16()? as usize;
        let name = reader.read_bytes(name_len)?.to_vec();
        let rcd = Rcd::decode(reader)?;

        let public_count = reader.read_u8()? as usize;
        let mut public_keys = Vec::with_capacity(public_count);
        for _ in 0..public_count {
            public_keys.push(reader.read_hash()?);
        }

        let private_count = reader.read_u8()? as usize;
        let mut private_keys = Vec::with_capacity(private_count);
        for _ in 0..private_count {
            private_keys.push(reader.read_array::<PRIVATE_LENGTH>()?);
        }

        if public_count != private_count {
            return Err(EntryError::KeyCountMismatch {
                public: public_count,
                private: private_count,
            });
        }

        Ok(Self {
            kind,
            name,
            rcd: Some(rcd),
            public_keys,
            private_keys,
        })
    }

    /// Decodes exactly one entry; trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EntryError> {
        let mut reader = Reader::new(bytes);
        let entry = Self::decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(EntryError::TrailingBytes(reader.remaining()));
        }
        Ok(entry)
    }
}

impl fmt::Debug for WalletEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletEntry")
            .field("kind", &self.kind)
            .field("name", &self.name())
            .field("rcd", &self.rcd)
            .field("public_keys", &self.public_keys.len())
            .finish_non_exhaustive()
    }
}

/// Human-readable dump including private key material. For display only.
impl fmt::Display for WalletEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name:  {}", self.name())?;
        match self.address() {
            Ok(address) => writeln!(
                f,
                " {} address: {}",
                self.kind,
                address.to_user_string(self.kind)
            )?,
            Err(_) => writeln!(f, " {} address: <none>", self.kind)?,
        }
        write!(f, "\n public:  ")?;
        for (i, pk) in self.public_keys.iter().enumerate() {
            writeln!(f, "{i:5} {}", hex::encode(pk))?;
        }
        write!(f, "\n private:  ")?;
        for (i, sk) in self.private_keys.iter().enumerate() {
            writeln!(f, "{i:5} {}", hex::encode(sk))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeError;

    fn entry_with_keys(kind: AddressKind, name: &[u8], n: usize) -> WalletEntry {
        let mut entry = WalletEntry::new(kind, name);
        for _ in 0..n {
            let kp = Keypair::generate();
            entry
                .add_key(&kp.public_key_bytes(), &kp.secret_bytes())
                .unwrap();
        }
        entry
    }

    #[test]
    fn roundtrip_preserves_every_field() {
        for (n, name_len) in [(1usize, 0usize), (3, 7), (255, 300), (1, 65_535)] {
            let name = vec![b'x'; name_len];
            let entry = entry_with_keys(AddressKind::Factoid, &name, n);
            let decoded = WalletEntry::from_bytes(&entry.to_bytes().unwrap()).unwrap();
            assert_eq!(decoded, entry);
        }
    }

    #[test]
    fn roundtrip_entry_credit_kind() {
        let entry = entry_with_keys(AddressKind::EntryCredit, b"ec", 2);
        let decoded = WalletEntry::from_bytes(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.kind(), AddressKind::EntryCredit);
        assert_eq!(decoded, entry);
    }

    #[test]
    fn empty_key_lists_roundtrip() {
        let mut entry = WalletEntry::new(AddressKind::Factoid, "bare");
        entry.set_rcd(Rcd::single([5u8; 32]));
        let decoded = WalletEntry::from_bytes(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, entry);
        assert!(decoded.public_keys().is_empty());
    }

    #[test]
    fn add_key_normalizes_private_record() {
        let kp = Keypair::generate();
        let mut entry = WalletEntry::new(AddressKind::Factoid, "a");
        let mut record = [0xeeu8; 64];
        record[..32].copy_from_slice(&kp.secret_bytes());
        entry.add_key(&kp.public_key_bytes(), &record).unwrap();
        assert_eq!(entry.private_keys()[0], kp.private_record());
    }

    #[test]
    fn add_key_rejects_bad_lengths() {
        let mut entry = WalletEntry::new(AddressKind::Factoid, "a");
        assert!(matches!(
            entry.add_key(&[0u8; 31], &[0u8; 32]),
            Err(EntryError::Key(KeyError::InvalidPublicKey(31)))
        ));
        assert!(matches!(
            entry.add_key(&[0u8; 32], &[0u8; 48]),
            Err(EntryError::Key(KeyError::InvalidSecretKey(48)))
        ));
        assert!(entry.public_keys().is_empty());
    }

    #[test]
    fn add_key_resets_condition_to_latest_key() {
        let entry = entry_with_keys(AddressKind::Factoid, b"multi", 2);
        assert_eq!(entry.rcd(), Some(&Rcd::single(entry.public_keys()[1])));
    }

    #[test]
    fn ec_address_is_first_public_key() {
        let entry = entry_with_keys(AddressKind::EntryCredit, b"ec", 2);
        assert_eq!(
            entry.address().unwrap(),
            Address::new(entry.public_keys()[0])
        );
    }

    #[test]
    fn address_without_material_fails() {
        assert!(matches!(
            WalletEntry::new(AddressKind::EntryCredit, "e").address(),
            Err(EntryError::NoPublicKey)
        ));
        assert!(matches!(
            WalletEntry::new(AddressKind::Factoid, "f").address(),
            Err(EntryError::MissingRcd)
        ));
    }

    #[test]
    fn matches_ignores_name_and_private_keys() {
        let a = entry_with_keys(AddressKind::Factoid, b"one", 1);
        let mut b = a.clone();
        b.set_name("two");
        b.private_keys[0] = [0u8; 64];
        assert!(a.matches(&b));

        let mut c = a.clone();
        c.kind = AddressKind::EntryCredit;
        assert!(!a.matches(&c));
        assert!(!a.matches(&entry_with_keys(AddressKind::Factoid, b"one", 1)));
    }

    #[test]
    fn invalid_kind_byte_is_malformed() {
        let mut bytes = entry_with_keys(AddressKind::Factoid, b"k", 1)
            .to_bytes()
            .unwrap();
        bytes[0] = 2;
        assert!(matches!(
            WalletEntry::from_bytes(&bytes),
            Err(EntryError::InvalidKind(2))
        ));
    }

    #[test]
    fn every_truncation_fails_cleanly() {
        let bytes = entry_with_keys(AddressKind::Factoid, b"trunc", 1)
            .to_bytes()
            .unwrap();
        for cut in 0..bytes.len() {
            assert!(
                matches!(
                    WalletEntry::from_bytes(&bytes[..cut]),
                    Err(EntryError::Truncated(DecodeError::UnexpectedEof { .. }))
                ),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = entry_with_keys(AddressKind::Factoid, b"t", 1)
            .to_bytes()
            .unwrap();
        bytes.push(0);
        assert!(matches!(
            WalletEntry::from_bytes(&bytes),
            Err(EntryError::TrailingBytes(1))
        ));
    }

    #[test]
    fn sign_uses_first_private_key() {
        let entry = entry_with_keys(AddressKind::EntryCredit, b"s", 1);
        let sig = entry.sign(b"msg").unwrap();
        assert!(entry.keypair().unwrap().verify(b"msg", &sig));
    }

    #[test]
    fn display_lists_name_and_indexed_keys() {
        let entry = entry_with_keys(AddressKind::Factoid, b"shown", 1);
        let text = entry.to_string();
        assert!(text.starts_with("name:  shown\n factoid address: FA"));
        assert!(text.contains(&format!("    0 {}", hex::encode(entry.public_keys()[0]))));
        assert!(text.contains(&hex::encode(entry.private_keys()[0])));
    }
}

//! Persistent credential index.

use std::sync::Arc;

use tracing::{debug, info};

use super::{EntryError, WalletEntry};
use crate::address::{Address, AddressKind, AddressRef};
use crate::config::MAX_NAME_LENGTH;
use crate::crypto::{Keypair, Signature};
use crate::storage::{KeyValueStore, NS_WALLET_ADDRESSES, NS_WALLET_NAMES};

/// Credentials indexed by name and by address.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Creates a fresh factoid credential under `name`.
    pub fn generate_factoid_address(&self, name: &str) -> Result<WalletEntry, EntryError> {
        self.generate(AddressKind::Factoid, name)
    }

    /// Creates a fresh entry-credit credential under `name`.
    pub fn generate_ec_address(&self, name: &str) -> Result<WalletEntry, EntryError> {
        self.generate(AddressKind::EntryCredit, name)
    }

    fn generate(&self, kind: AddressKind, name: &str) -> Result<WalletEntry, EntryError> {
        let keypair = Keypair::generate();
        self.add_keypair(kind, name, &keypair)
    }

    /// Adds a credential for known secret material: a 32-byte secret or a
    /// 64-byte `secret ‖ public` record.
    pub fn import_private_key(
        &self,
        kind: AddressKind,
        name: &str,
        secret: &[u8],
    ) -> Result<WalletEntry, EntryError> {
        let keypair = Keypair::from_private_bytes(secret)?;
        self.add_keypair(kind, name, &keypair)
    }

    fn add_keypair(
        &self,
        kind: AddressKind,
        name: &str,
        keypair: &Keypair,
    ) -> Result<WalletEntry, EntryError> {
        check_name(name)?;
        if self.store.contains(NS_WALLET_NAMES, name.as_bytes())? {
            return Err(EntryError::DuplicateName(name.to_string()));
        }

        let mut entry = WalletEntry::new(kind, name);
        entry.add_key(&keypair.public_key_bytes(), &keypair.secret_bytes())?;
        let address = entry.address()?;
        if self.store.contains(NS_WALLET_ADDRESSES, address.as_bytes())? {
            return Err(EntryError::DuplicateAddress(address.to_user_string(kind)));
        }

        let bytes = entry.to_bytes()?;
        self.store.put(NS_WALLET_NAMES, name.as_bytes(), Some(&bytes))?;
        self.store
            .put(NS_WALLET_ADDRESSES, address.as_bytes(), Some(&bytes))?;

        info!(name, %kind, address = %address.to_user_string(kind), "credential added");
        Ok(entry)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<WalletEntry>, EntryError> {
        self.load(NS_WALLET_NAMES, name.as_bytes())
    }

    pub fn get_by_address(&self, address: &Address) -> Result<Option<WalletEntry>, EntryError> {
        self.load(NS_WALLET_ADDRESSES, address.as_bytes())
    }

    fn load(&self, namespace: &str, key: &[u8]) -> Result<Option<WalletEntry>, EntryError> {
        match self.store.get(namespace, key)? {
            Some(bytes) => WalletEntry::from_bytes(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Looks up the credential a reference points at. Direct addresses go
    /// through the address index; names through the name index.
    pub fn resolve(&self, reference: &AddressRef) -> Result<Option<WalletEntry>, EntryError> {
        match reference {
            AddressRef::Literal(address) | AddressRef::Hex(address) => {
                self.get_by_address(address)
            }
            AddressRef::Name(name) => self.get_by_name(name),
        }
    }

    /// Every credential, ordered by name.
    pub fn list(&self) -> Result<Vec<WalletEntry>, EntryError> {
        let mut entries = Vec::new();
        for key in self.store.keys(NS_WALLET_NAMES)? {
            if let Some(entry) = self.load(NS_WALLET_NAMES, &key)? {
                entries.push(entry);
            }
        }
        debug!(count = entries.len(), "listed credentials");
        Ok(entries)
    }

    /// Signs `message` with the entry's first private key.
    pub fn sign(&self, entry: &WalletEntry, message: &[u8]) -> Result<Signature, EntryError> {
        entry.sign(message)
    }
}

fn check_name(name: &str) -> Result<(), EntryError> {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH || name.chars().any(char::is_whitespace) {
        return Err(EntryError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn generated_entry_is_found_by_name_and_address() {
        let creds = store();
        let entry = creds.generate_factoid_address("alice").unwrap();
        let address = entry.address().unwrap();

        assert_eq!(creds.get_by_name("alice").unwrap(), Some(entry.clone()));
        assert_eq!(creds.get_by_address(&address).unwrap(), Some(entry));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let creds = store();
        creds.generate_ec_address("pay").unwrap();
        assert!(matches!(
            creds.generate_factoid_address("pay"),
            Err(EntryError::DuplicateName(_))
        ));
    }

    #[test]
    fn bad_names_are_rejected() {
        let creds = store();
        for name in ["", "has space", &"x".repeat(33)] {
            assert!(matches!(
                creds.generate_factoid_address(name),
                Err(EntryError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn import_reproduces_the_same_address() {
        let creds = store();
        let keypair = Keypair::generate();
        let entry = creds
            .import_private_key(AddressKind::EntryCredit, "ec", &keypair.secret_bytes())
            .unwrap();
        assert_eq!(
            entry.address().unwrap(),
            Address::new(keypair.public_key_bytes())
        );
    }

    #[test]
    fn importing_the_same_key_twice_is_rejected() {
        let creds = store();
        let secret = Keypair::generate().private_record();
        creds
            .import_private_key(AddressKind::Factoid, "one", &secret)
            .unwrap();
        assert!(matches!(
            creds.import_private_key(AddressKind::Factoid, "two", &secret),
            Err(EntryError::DuplicateAddress(_))
        ));
    }

    #[test]
    fn resolve_follows_the_reference_shape() {
        let creds = store();
        let entry = creds.generate_ec_address("ec1").unwrap();
        let address = entry.address().unwrap();

        let by_hex = AddressRef::hex(&address.to_hex()).unwrap();
        let by_name = AddressRef::name("ec1").unwrap();
        assert_eq!(creds.resolve(&by_hex).unwrap(), Some(entry.clone()));
        assert_eq!(creds.resolve(&by_name).unwrap(), Some(entry));
        assert_eq!(
            creds.resolve(&AddressRef::name("nobody").unwrap()).unwrap(),
            None
        );
    }

    #[test]
    fn list_is_sorted_by_name() {
        let creds = store();
        creds.generate_factoid_address("zed").unwrap();
        creds.generate_ec_address("amy").unwrap();
        let names: Vec<_> = creds
            .list()
            .unwrap()
            .iter()
            .map(|e| e.name().into_owned())
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }
}

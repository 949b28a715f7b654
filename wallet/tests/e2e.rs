//! End-to-end tests for the wallet controller.
//!
//! These run the full staged-transaction lifecycle against a sled database in
//! a temporary directory and an in-memory node: credential generation, input
//! and output resolution, fee validation, signing, relay, and clearing. A
//! final test reopens the database to check that state survives a process
//! boundary.

use std::sync::Arc;

use factoid_wallet::address::{format_fixed_point, Address, AddressKind, AddressRef};
use factoid_wallet::commit::{CommitRequest, CommitSigner};
use factoid_wallet::config::{DEFAULT_EC_RATE, PATH_COMMIT_CHAIN, PATH_FACTOID_SUBMIT};
use factoid_wallet::credential::CredentialStore;
use factoid_wallet::node::MockNode;
use factoid_wallet::storage::{KeyValueStore, SledStore, NS_BUILD_TRANSACTIONS};
use factoid_wallet::transaction::{
    minimum_fee, validate_signatures, Transaction, TransactionBuilder, TransactionError, TxAddress,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct Wallet {
    store: Arc<SledStore>,
    credentials: CredentialStore,
    builder: TransactionBuilder,
    node: Arc<MockNode>,
    _dir: tempfile::TempDir,
}

fn open_wallet() -> Wallet {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(SledStore::open(dir.path().join("wallet.db")).expect("open sled"));
    let credentials = CredentialStore::new(store.clone());
    let node = Arc::new(MockNode::new());
    let builder = TransactionBuilder::new(
        store.clone(),
        credentials.clone(),
        node.clone(),
        DEFAULT_EC_RATE,
    );
    Wallet {
        store,
        credentials,
        builder,
        node,
        _dir: dir,
    }
}

/// Fee for a one-input, one-output transaction at the default rate.
fn one_to_one_fee() -> u64 {
    let mut probe = Transaction::new(0);
    probe
        .inputs
        .push(TxAddress::new(Address::new([0; 32]), 200_000_000));
    probe
        .outputs
        .push(TxAddress::new(Address::new([0; 32]), 100_000_000));
    minimum_fee(&probe, DEFAULT_EC_RATE).expect("fee")
}

// ---------------------------------------------------------------------------
// Staged transaction lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_add_sign_submit_clears_the_key() {
    let w = open_wallet();
    let alice = w.credentials.generate_factoid_address("addrA").unwrap();
    let bob = w.credentials.generate_factoid_address("addrB").unwrap();

    let input = format_fixed_point(100_000_000 + one_to_one_fee());

    w.builder.start("tx1").await.unwrap();
    w.builder
        .add_input("tx1", &AddressRef::parse(AddressKind::Factoid, "addrA").unwrap(), &input)
        .await
        .unwrap();
    let bob_string = bob.address().unwrap().to_user_string(AddressKind::Factoid);
    w.builder
        .add_output("tx1", &AddressRef::parse(AddressKind::Factoid, &bob_string).unwrap(), "1")
        .await
        .unwrap();

    let signed = w.builder.sign("tx1").await.unwrap();
    assert_eq!(signed.inputs[0].address, alice.address().unwrap());
    validate_signatures(&signed).unwrap();

    let submission = w.builder.submit("tx1").await.unwrap();
    assert!(submission.outcome.is_success());
    assert!(w.builder.get("tx1").await.unwrap().is_none());

    let posts = w.node.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].path, PATH_FACTOID_SUBMIT);
    let relayed = hex::decode(posts[0].body["Transaction"].as_str().unwrap()).unwrap();
    assert_eq!(Transaction::from_bytes(&relayed).unwrap(), signed);
}

#[tokio::test]
async fn equal_input_and_output_cannot_pay_the_fee() {
    let w = open_wallet();
    w.credentials.generate_factoid_address("addrA").unwrap();
    w.builder.start("tx1").await.unwrap();
    w.builder
        .add_input("tx1", &AddressRef::name("addrA").unwrap(), "100")
        .await
        .unwrap();
    w.builder
        .add_output("tx1", &AddressRef::Hex(Address::new([2; 32])), "100")
        .await
        .unwrap();

    for result in [
        w.builder.sign("tx1").await.map(|_| ()),
        w.builder.submit("tx1").await.map(|_| ()),
    ] {
        assert!(matches!(
            result,
            Err(TransactionError::InsufficientFee { .. })
        ));
    }
    assert!(w.builder.get("tx1").await.unwrap().is_some());
    assert!(w.node.posts().is_empty());
}

#[tokio::test]
async fn relay_failure_still_clears_after_validation() {
    let w = open_wallet();
    w.credentials.generate_factoid_address("addrA").unwrap();
    let input = format_fixed_point(100_000_000 + one_to_one_fee());

    w.builder.start("tx1").await.unwrap();
    w.builder
        .add_input("tx1", &AddressRef::name("addrA").unwrap(), &input)
        .await
        .unwrap();
    w.builder
        .add_output("tx1", &AddressRef::Hex(Address::new([2; 32])), "1")
        .await
        .unwrap();
    w.builder.sign("tx1").await.unwrap();

    w.node.fail_posts();
    assert!(w.builder.submit("tx1").await.is_err());
    assert!(w
        .store
        .get(NS_BUILD_TRANSACTIONS, b"tx1")
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn credentials_and_staged_transactions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.db");

    let address = {
        let store = Arc::new(SledStore::open(&path).unwrap());
        let credentials = CredentialStore::new(store.clone());
        let builder = TransactionBuilder::new(
            store.clone(),
            credentials.clone(),
            Arc::new(MockNode::new()),
            DEFAULT_EC_RATE,
        );
        let entry = credentials.generate_ec_address("pay").unwrap();
        builder.start("later").await.unwrap();
        entry.address().unwrap()
    };

    let store = Arc::new(SledStore::open(&path).unwrap());
    let credentials = CredentialStore::new(store.clone());
    let reopened = credentials.get_by_address(&address).unwrap().unwrap();
    assert_eq!(reopened.name(), "pay");

    let builder = TransactionBuilder::new(
        store,
        credentials,
        Arc::new(MockNode::new()),
        DEFAULT_EC_RATE,
    );
    assert_eq!(builder.keys().unwrap(), vec!["later".to_string()]);
}

// ---------------------------------------------------------------------------
// Commits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chain_commit_from_sled_backed_credential() {
    let w = open_wallet();
    let entry = w.credentials.generate_ec_address("ec").unwrap();
    let signer = CommitSigner::new(w.credentials.clone(), w.node.clone());

    let payer = AddressRef::parse(
        AddressKind::EntryCredit,
        &entry.address().unwrap().to_user_string(AddressKind::EntryCredit),
    )
    .unwrap();
    let request = CommitRequest::from_json(r#"{"Message":"0102030405"}"#).unwrap();
    signer.commit_chain(&payer, &request).await.unwrap();

    let posts = w.node.posts();
    assert_eq!(posts[0].path, PATH_COMMIT_CHAIN);
    let payload = hex::decode(posts[0].body["CommitChainMsg"].as_str().unwrap()).unwrap();
    assert_eq!(payload.len(), 5 + 32 + 64);
}

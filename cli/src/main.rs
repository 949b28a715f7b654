// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Factoid Wallet CLI
//!
//! Entry point for the `fctwallet` binary. Parses CLI arguments, initializes
//! logging, opens the wallet database in the data directory, and runs one
//! wallet command against it.
//!
//! Command output goes to stdout; logs go to stderr.

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;

use factoid_wallet::address::{
    decode_user_address, format_fixed_point, is_valid_user_address, Address, AddressKind,
    AddressRef,
};
use factoid_wallet::commit::{CommitRequest, CommitSigner};
use factoid_wallet::config::WalletConfig;
use factoid_wallet::credential::CredentialStore;
use factoid_wallet::history::{load_checkpoint, save_checkpoint, HistoryScanner};
use factoid_wallet::node::{HttpNodeClient, NodeClient};
use factoid_wallet::storage::{KeyValueStore, SledStore};
use factoid_wallet::transaction::{minimum_fee, TransactionBuilder};

use cli::{Commands, FctWalletCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = FctWalletCli::parse();
    logging::init_logging(&cli.global.log_level, cli.global.log_format);

    let config = cli.global.wallet_config();
    let wallet = Wallet::open(&config)?;
    wallet.run(cli.command).await
}

/// Everything one command invocation needs, opened against a single
/// data directory and node.
struct Wallet {
    store: Arc<dyn KeyValueStore>,
    node: Arc<dyn NodeClient>,
    credentials: CredentialStore,
    builder: TransactionBuilder,
    signer: CommitSigner,
    ec_rate: u64,
}

impl Wallet {
    fn open(config: &WalletConfig) -> Result<Self> {
        // --- Persistent storage ---
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!(
                "failed to create data directory: {}",
                config.data_dir.display()
            )
        })?;
        let db_path = config.db_path();
        let store: Arc<dyn KeyValueStore> = Arc::new(
            SledStore::open(&db_path)
                .with_context(|| format!("failed to open database at {}", db_path.display()))?,
        );
        tracing::debug!(path = %db_path.display(), "database opened");

        // --- Node client ---
        let node: Arc<dyn NodeClient> = Arc::new(
            HttpNodeClient::new(config)
                .with_context(|| format!("failed to build client for {}", config.node_url))?,
        );

        let credentials = CredentialStore::new(store.clone());
        let builder = TransactionBuilder::new(
            store.clone(),
            credentials.clone(),
            node.clone(),
            config.ec_rate,
        );
        let signer = CommitSigner::new(credentials.clone(), node.clone());

        Ok(Self {
            store,
            node,
            credentials,
            builder,
            signer,
            ec_rate: config.ec_rate,
        })
    }

    async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::NewAddress(args) => {
                let entry = self.credentials.generate_factoid_address(&args.name)?;
                print_address(entry.kind(), &entry.address()?);
            }
            Commands::NewEcAddress(args) => {
                let entry = self.credentials.generate_ec_address(&args.name)?;
                print_address(entry.kind(), &entry.address()?);
            }
            Commands::ImportKey(args) => {
                let secret = hex::decode(args.secret.trim())
                    .context("private key is not valid hex")?;
                let kind = if args.ec {
                    AddressKind::EntryCredit
                } else {
                    AddressKind::Factoid
                };
                let entry = self
                    .credentials
                    .import_private_key(kind, &args.name, &secret)?;
                print_address(entry.kind(), &entry.address()?);
            }
            Commands::Addresses => self.list_addresses()?,
            Commands::NewTransaction(args) => {
                self.builder.start(&args.key).await?;
            }
            Commands::AddInput(args) => {
                let input = args.address.to_ref(AddressKind::Factoid)?;
                self.builder
                    .add_input(&args.key, &input, &args.amount)
                    .await?;
            }
            Commands::AddOutput(args) => {
                let output = args.address.to_ref(AddressKind::Factoid)?;
                self.builder
                    .add_output(&args.key, &output, &args.amount)
                    .await?;
            }
            Commands::AddEcOutput(args) => {
                let output = args.address.to_ref(AddressKind::EntryCredit)?;
                self.builder
                    .add_ec_output(&args.key, &output, &args.amount)
                    .await?;
            }
            Commands::Sign(args) => {
                let tx = self.builder.sign(&args.key).await?;
                println!("{tx}");
            }
            Commands::Submit(args) => {
                let submission = self.builder.submit(&args.key).await?;
                println!("txid: {}", submission.txid);
                if !submission.outcome.is_success() {
                    bail!(
                        "node refused transaction (status {}): {}",
                        submission.outcome.status,
                        submission.outcome.body.trim()
                    );
                }
            }
            Commands::DeleteTransaction(args) => {
                self.builder.delete(&args.key).await?;
            }
            Commands::Print(args) => self.print(args.key.as_deref()).await?,
            Commands::CommitChain(args) => {
                let payer = args.payer.to_ref(AddressKind::EntryCredit)?;
                let request = CommitRequest::from_json(&args.request)?;
                let outcome = self.signer.commit_chain(&payer, &request).await?;
                println!("chain commit accepted (status {})", outcome.status);
            }
            Commands::CommitEntry(args) => {
                let request = CommitRequest::from_json(&args.request)?;
                let outcome = self.signer.commit_entry(&args.name, &request).await?;
                println!("entry commit accepted (status {})", outcome.status);
            }
            Commands::Transactions(args) => {
                self.transactions(&args.addresses, args.new_only).await?;
            }
        }
        Ok(())
    }

    fn list_addresses(&self) -> Result<()> {
        for entry in self.credentials.list()? {
            let kind = entry.kind();
            let address = entry.address()?;
            println!(
                "{:<32} {:<12} {}",
                entry.name(),
                kind.to_string(),
                address.to_user_string(kind)
            );
        }
        Ok(())
    }

    async fn print(&self, key: Option<&str>) -> Result<()> {
        let Some(key) = key else {
            for key in self.builder.keys()? {
                println!("{key}");
            }
            return Ok(());
        };

        let Some(tx) = self.builder.get(key).await? else {
            bail!("no transaction is staged under '{key}'");
        };
        println!("{tx}");
        let fee = minimum_fee(&tx, self.ec_rate)?;
        println!("  fee:       {}", format_fixed_point(fee));
        Ok(())
    }

    /// Walks the block history and prints matching transactions. With
    /// `new_only`, the walk starts at the tip saved by the previous run.
    async fn transactions(&self, filters: &[String], new_only: bool) -> Result<()> {
        let addresses = filters
            .iter()
            .map(|f| self.filter_address(f))
            .collect::<Result<Vec<_>>>()?;

        let checkpoint = if new_only {
            load_checkpoint(self.store.as_ref())?
        } else {
            None
        };
        let mut scanner = match checkpoint {
            Some(tip) => HistoryScanner::with_checkpoint(self.node.clone(), tip),
            None => HistoryScanner::new(self.node.clone()),
        };

        let report = scanner
            .dump_transactions(&addresses)
            .await
            .context("failed to scan block history")?;
        print!("{report}");

        save_checkpoint(self.store.as_ref(), &scanner.checkpoint())?;
        Ok(())
    }

    /// Resolves a history filter: an entry-credit or factoid address
    /// string, a hex address, or the name of a credential in this wallet.
    fn filter_address(&self, filter: &str) -> Result<Address> {
        if is_valid_user_address(AddressKind::EntryCredit, filter) {
            return Ok(decode_user_address(AddressKind::EntryCredit, filter)?);
        }
        let reference = AddressRef::parse(AddressKind::Factoid, filter)?;
        if let Some(address) = reference.direct() {
            return Ok(address);
        }
        match self.credentials.resolve(&reference)? {
            Some(entry) => Ok(entry.address()?),
            None => bail!("unknown address or name '{filter}'"),
        }
    }
}

fn print_address(kind: AddressKind, address: &Address) {
    println!("{}", address.to_user_string(kind));
}

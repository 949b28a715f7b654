//! # CLI Interface
//!
//! Defines the command-line argument structure for `fctwallet` using
//! `clap` derive. Global options configure the node connection and the
//! data directory; each subcommand maps onto one wallet operation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use factoid_wallet::address::{AddressError, AddressKind, AddressRef};
use factoid_wallet::config::{WalletConfig, DEFAULT_EC_RATE, DEFAULT_NODE_URL};

use crate::logging::LogFormat;

/// Factoid wallet controller.
///
/// Holds signing credentials in a local database, stages and signs
/// transactions, signs chain and entry commits, and lists past activity
/// by walking the node's block history.
#[derive(Parser, Debug)]
#[command(
    name = "fctwallet",
    about = "Factoid wallet controller",
    version,
    propagate_version = true
)]
pub struct FctWalletCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Base URL of the node API.
    #[arg(long, global = true, env = "FCT_NODE_URL", default_value = DEFAULT_NODE_URL)]
    pub node_url: String,

    /// Directory holding the wallet database. Created on first use.
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "FCT_DATA_DIR",
        default_value = ".fctwallet"
    )]
    pub data_dir: PathBuf,

    /// Entry-credit price in factoshis, used for fee checks.
    #[arg(long, global = true, env = "FCT_EC_RATE", default_value_t = DEFAULT_EC_RATE)]
    pub ec_rate: u64,

    /// Per-request timeout for node calls, in seconds.
    #[arg(long, global = true, env = "FCT_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "fctwallet=warn,factoid_wallet=warn")]
    pub log_level: String,

    /// Log output format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl GlobalArgs {
    pub fn wallet_config(&self) -> WalletConfig {
        WalletConfig {
            node_url: self.node_url.clone(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ec_rate: self.ec_rate,
            data_dir: self.data_dir.clone(),
        }
    }
}

/// Top-level subcommands for the wallet binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a factoid credential under a new name.
    NewAddress(NewAddressArgs),
    /// Generate an entry-credit credential under a new name.
    NewEcAddress(NewAddressArgs),
    /// Import an existing private key under a new name.
    ImportKey(ImportKeyArgs),
    /// List every credential in the wallet.
    Addresses,
    /// Start staging a transaction under a key.
    NewTransaction(TxKeyArgs),
    /// Add a factoid input to a staged transaction.
    AddInput(TxAmountArgs),
    /// Add a factoid output to a staged transaction.
    AddOutput(TxAmountArgs),
    /// Add an entry-credit output to a staged transaction.
    AddEcOutput(TxAmountArgs),
    /// Check the fee and sign every input of a staged transaction.
    Sign(TxKeyArgs),
    /// Relay a signed transaction to the node and clear its key.
    Submit(TxKeyArgs),
    /// Drop a staged transaction without relaying it.
    DeleteTransaction(TxKeyArgs),
    /// Show a staged transaction, or list staged keys when none is given.
    Print(PrintArgs),
    /// Sign and relay a chain commit.
    CommitChain(CommitChainArgs),
    /// Sign and relay an entry commit.
    CommitEntry(CommitEntryArgs),
    /// List past transactions, optionally only those touching ADDRESSES.
    Transactions(TransactionsArgs),
}

#[derive(Args, Debug)]
pub struct NewAddressArgs {
    /// Name for the new credential (at most 32 bytes, no whitespace).
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ImportKeyArgs {
    /// Name for the imported credential.
    pub name: String,

    /// Private key as hex: a 32-byte secret or a 64-byte secret and public pair.
    pub secret: String,

    /// Store the key as an entry-credit credential.
    #[arg(long)]
    pub ec: bool,
}

#[derive(Args, Debug)]
pub struct TxKeyArgs {
    /// Staging key of the transaction.
    pub key: String,
}

#[derive(Args, Debug)]
pub struct TxAmountArgs {
    /// Staging key of the transaction.
    pub key: String,

    #[command(flatten)]
    pub address: AddressArg,

    /// Amount in factoids, e.g. `1.5`.
    pub amount: String,
}

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Staging key of the transaction.
    pub key: Option<String>,
}

#[derive(Args, Debug)]
pub struct CommitChainArgs {
    #[command(flatten)]
    pub payer: AddressArg,

    /// Commit request as JSON, `{"Message": "<hex>"}`.
    pub request: String,
}

#[derive(Args, Debug)]
pub struct CommitEntryArgs {
    /// Name of the paying entry-credit credential.
    pub name: String,

    /// Commit request as JSON, `{"Message": "<hex>"}`.
    pub request: String,
}

#[derive(Args, Debug)]
pub struct TransactionsArgs {
    /// Addresses, hex addresses, or credential names to filter by.
    pub addresses: Vec<String>,

    /// Only scan blocks added since the previous `transactions` run.
    #[arg(long)]
    pub new_only: bool,
}

/// How an address argument is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AddressForm {
    /// A credential name in this wallet.
    Name,
    /// A raw 32-byte address as 64 hex characters.
    Hex,
    /// A user-facing address string.
    Address,
}

/// An address argument. Without `--as`, it is tried as an address string,
/// then as hex, then as a credential name.
#[derive(Args, Debug)]
pub struct AddressArg {
    /// Address string, hex address, or credential name.
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Read ADDRESS only in this form.
    #[arg(long = "as", value_enum, value_name = "FORM")]
    pub form: Option<AddressForm>,
}

impl AddressArg {
    pub fn to_ref(&self, kind: AddressKind) -> Result<AddressRef, AddressError> {
        match self.form {
            Some(AddressForm::Name) => AddressRef::name(&self.address),
            Some(AddressForm::Hex) => AddressRef::hex(&self.address),
            Some(AddressForm::Address) => AddressRef::literal(kind, &self.address),
            None => AddressRef::parse(kind, &self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        FctWalletCli::command().debug_assert();
    }

    fn parse(args: &[&str]) -> FctWalletCli {
        FctWalletCli::try_parse_from(std::iter::once("fctwallet").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn amount_arguments_take_key_then_address_then_amount() {
        for sub in ["add-input", "add-output", "add-ec-output"] {
            let cli = parse(&[sub, "tx1", "savings", "2.5"]);
            let args = match cli.command {
                Commands::AddInput(args)
                | Commands::AddOutput(args)
                | Commands::AddEcOutput(args) => args,
                other => panic!("wrong subcommand: {other:?}"),
            };
            assert_eq!(args.key, "tx1");
            assert_eq!(args.address.address, "savings");
            assert_eq!(args.amount, "2.5");
        }

        let missing =
            FctWalletCli::try_parse_from(["fctwallet", "add-input", "tx1", "savings"]);
        assert!(missing.is_err());
    }

    #[test]
    fn bare_address_falls_back_to_a_name() {
        let cli = parse(&["add-output", "tx1", "savings", "2.5"]);
        let Commands::AddOutput(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(
            args.address.to_ref(AddressKind::Factoid).unwrap(),
            AddressRef::Name("savings".into())
        );
    }

    #[test]
    fn explicit_hex_is_not_treated_as_a_name() {
        let cli = parse(&["add-output", "tx1", "abcd", "1", "--as", "hex"]);
        let Commands::AddOutput(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert!(args.address.to_ref(AddressKind::Factoid).is_err());
    }

    #[test]
    fn commit_chain_takes_payer_first() {
        let cli = parse(&["commit-chain", "ec1", r#"{"Message":"00"}"#, "--as", "name"]);
        let Commands::CommitChain(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(
            args.payer.to_ref(AddressKind::EntryCredit).unwrap(),
            AddressRef::Name("ec1".into())
        );
        assert_eq!(args.request, r#"{"Message":"00"}"#);
    }

    #[test]
    fn global_options_build_the_config() {
        let cli = parse(&[
            "addresses",
            "--node-url",
            "http://node:9000",
            "--ec-rate",
            "2500",
            "--timeout-secs",
            "3",
        ]);
        let config = cli.global.wallet_config();
        assert_eq!(config.node_url, "http://node:9000");
        assert_eq!(config.ec_rate, 2500);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.db_path(), PathBuf::from(".fctwallet").join("wallet.db"));
    }
}

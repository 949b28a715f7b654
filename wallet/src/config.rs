//! # Wallet Configuration & Constants
//!
//! Every fixed length, path, and default the wallet relies on lives here.
//! The byte lengths are part of the on-disk credential format and of the
//! transaction wire format, so changing one is a format break.

use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Key Material
// ---------------------------------------------------------------------------

/// Length of an address, a public key, and every block reference (KeyMR,
/// chain id). Everything that identifies something is 32 bytes.
pub const ADDRESS_LENGTH: usize = 32;

/// Length of the Ed25519 secret scalar.
pub const SECRET_LENGTH: usize = 32;

/// Length of a stored private-key record: the secret scalar followed by its
/// public key.
pub const PRIVATE_LENGTH: usize = SECRET_LENGTH + ADDRESS_LENGTH;

/// Ed25519 signature length.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Naming Limits
// ---------------------------------------------------------------------------

/// Longest credential name the lookup paths accept. The wire format can carry
/// up to `u16::MAX` bytes, but names beyond this are rejected by every
/// caller-facing operation.
pub const MAX_NAME_LENGTH: usize = 32;

/// Longest staged-transaction key.
pub const MAX_KEY_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Amounts & Fees
// ---------------------------------------------------------------------------

/// Decimal places of one factoid. `1.0` FCT is `100_000_000` factoshis.
pub const FACTOID_DECIMALS: u32 = 8;

/// Factoshis per factoid.
pub const FACTOSHIS_PER_FACTOID: u64 = 100_000_000;

/// Default price of one entry credit in factoshis, used to turn fee units
/// into an amount.
pub const DEFAULT_EC_RATE: u64 = 1_000;

/// Fee units charged per started kilobyte of the signed transaction.
pub const FEE_UNITS_PER_KB: u64 = 1;

/// Fee units charged per output (factoid or entry credit).
pub const FEE_UNITS_PER_OUTPUT: u64 = 10;

/// Fee units charged per input signature.
pub const FEE_UNITS_PER_SIGNATURE: u64 = 1;

/// Current transaction format version.
pub const TRANSACTION_VERSION: u8 = 2;

// ---------------------------------------------------------------------------
// Chain Identifiers
// ---------------------------------------------------------------------------

/// Chain id of the Factoid chain as it appears in directory block entries.
pub const FACTOID_CHAIN_ID: [u8; ADDRESS_LENGTH] = {
    let mut id = [0u8; ADDRESS_LENGTH];
    id[ADDRESS_LENGTH - 1] = 0x0f;
    id
};

/// The all-zero reference: previous-block pointer of the genesis block, and
/// the "nothing processed yet" checkpoint of a fresh scanner.
pub const ZERO_HASH: [u8; ADDRESS_LENGTH] = [0u8; ADDRESS_LENGTH];

// ---------------------------------------------------------------------------
// Node Endpoints
// ---------------------------------------------------------------------------

/// Default node API base URL.
pub const DEFAULT_NODE_URL: &str = "http://localhost:8088";

/// Default timeout for every round trip to the node.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const PATH_COMMIT_CHAIN: &str = "/v1/commit-chain";
pub const PATH_COMMIT_ENTRY: &str = "/v1/commit-entry/";
pub const PATH_FACTOID_SUBMIT: &str = "/v1/factoid-submit/";
pub const PATH_DIRECTORY_BLOCK_HEAD: &str = "/v1/directory-block-head/";
pub const PATH_GET_RAW_DATA: &str = "/v1/get-raw-data/";

// ---------------------------------------------------------------------------
// WalletConfig
// ---------------------------------------------------------------------------

/// Runtime settings for one wallet process.
///
/// The CLI fills this from flags and environment variables; library users
/// can start from `Default` and override what they need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    /// Base URL of the node API, without a trailing slash.
    pub node_url: String,
    /// Timeout applied to each HTTP request.
    pub request_timeout: Duration,
    /// Entry-credit price in factoshis, used by the fee calculation.
    pub ec_rate: u64,
    /// Directory holding the persistent key-value store.
    pub data_dir: PathBuf,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ec_rate: DEFAULT_EC_RATE,
            data_dir: PathBuf::from(".fctwallet"),
        }
    }
}

impl WalletConfig {
    /// Path of the sled database inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("wallet.db")
    }

    /// Joins an endpoint path onto the node URL, tolerating a trailing slash
    /// on the configured base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.node_url.trim_end_matches('/'), path)
    }
}

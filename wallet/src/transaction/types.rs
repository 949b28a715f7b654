//! The factoid transaction and its binary form.
//!
//! # Byte Format
//!
//! ```text
//! version(1) ‖ timestamp_ms(6, BE) ‖ in(1) ‖ out(1) ‖ ec(1)
//!   ‖ in  × (varint amount ‖ address(32))
//!   ‖ out × (varint amount ‖ address(32))
//!   ‖ ec  × (varint amount ‖ address(32))
//! ─── signable prefix ends here ───
//!   ‖ auth(1) ‖ auth × (rcd ‖ sigs(1) ‖ sigs × signature(64))
//! ```
//!
//! Authorisation block `i` belongs to input `i`. A transaction under
//! construction may carry fewer blocks than inputs; only a fully signed one
//! carries exactly one per input.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::TransactionError;
use crate::address::{format_fixed_point, Address, AddressKind};
use crate::codec::{write_u48, write_varint, Reader};
use crate::config::{ADDRESS_LENGTH, TRANSACTION_VERSION};
use crate::credential::Rcd;
use crate::crypto::{sha256, Hash, Signature};

// ---------------------------------------------------------------------------
// Building Blocks
// ---------------------------------------------------------------------------

/// An amount moving from or to one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxAddress {
    /// Factoshis.
    pub amount: u64,
    pub address: Address,
}

impl TxAddress {
    pub fn new(address: Address, amount: u64) -> Self {
        Self { amount, address }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        write_varint(buf, self.amount);
        buf.extend_from_slice(self.address.as_bytes());
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let amount = reader.read_varint()?;
        let address = Address::new(reader.read_hash()?);
        Ok(Self { amount, address })
    }

    fn decode_list(reader: &mut Reader<'_>, n: usize) -> Result<Vec<Self>, TransactionError> {
        (0..n).map(|_| Self::decode(reader)).collect()
    }
}

/// Proof that one input may be spent: the condition and its signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthBlock {
    pub rcd: Rcd,
    pub signatures: Vec<Signature>,
}

impl AuthBlock {
    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), TransactionError> {
        self.rcd.encode_into(buf);
        buf.push(count_byte(self.signatures.len())?);
        for sig in &self.signatures {
            buf.extend_from_slice(sig.as_bytes());
        }
        Ok(())
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let rcd = Rcd::decode(reader)?;
        let count = reader.read_u8()? as usize;
        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            signatures.push(Signature::from_bytes(reader.read_array()?));
        }
        Ok(Self { rcd, signatures })
    }
}

fn count_byte(len: usize) -> Result<u8, TransactionError> {
    u8::try_from(len).map_err(|_| TransactionError::TooManyEntries(len))
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A factoid transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u8,
    /// Milliseconds since the Unix epoch; only the low 48 bits are encoded.
    pub timestamp: u64,
    pub inputs: Vec<TxAddress>,
    pub outputs: Vec<TxAddress>,
    pub ec_outputs: Vec<TxAddress>,
    pub auths: Vec<AuthBlock>,
}

impl Transaction {
    /// An empty transaction stamped with `timestamp`.
    pub fn new(timestamp: u64) -> Self {
        Self {
            version: TRANSACTION_VERSION,
            timestamp,
            inputs: Vec::new(),
            outputs: Vec::new(),
            ec_outputs: Vec::new(),
            auths: Vec::new(),
        }
    }

    /// The bytes every input signs.
    pub fn signable_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        let io_count = self.inputs.len() + self.outputs.len() + self.ec_outputs.len();
        let mut buf = Vec::with_capacity(10 + io_count * (ADDRESS_LENGTH + 9));

        buf.push(self.version);
        write_u48(&mut buf, self.timestamp);
        buf.push(count_byte(self.inputs.len())?);
        buf.push(count_byte(self.outputs.len())?);
        buf.push(count_byte(self.ec_outputs.len())?);

        for io in self
            .inputs
            .iter()
            .chain(&self.outputs)
            .chain(&self.ec_outputs)
        {
            io.encode_into(&mut buf);
        }
        Ok(buf)
    }

    /// Transaction id: SHA-256 of the signable bytes, so it does not change
    /// when signatures are added.
    pub fn txid(&self) -> Result<Hash, TransactionError> {
        Ok(Hash::new(sha256(&self.signable_bytes()?)))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        let mut buf = self.signable_bytes()?;
        buf.push(count_byte(self.auths.len())?);
        for auth in &self.auths {
            auth.encode_into(&mut buf)?;
        }
        Ok(buf)
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let version = reader.read_u8()?;
        let timestamp = reader.read_u48()?;
        let in_count = reader.read_u8()? as usize;
        let out_count = reader.read_u8()? as usize;
        let ec_count = reader.read_u8()? as usize;

        let inputs = TxAddress::decode_list(reader, in_count)?;
        let outputs = TxAddress::decode_list(reader, out_count)?;
        let ec_outputs = TxAddress::decode_list(reader, ec_count)?;

        let auth_count = reader.read_u8()? as usize;
        if auth_count > in_count {
            return Err(TransactionError::Malformed(format!(
                "{auth_count} authorisations for {in_count} inputs"
            )));
        }
        let auths = (0..auth_count)
            .map(|_| AuthBlock::decode(reader))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version,
            timestamp,
            inputs,
            outputs,
            ec_outputs,
            auths,
        })
    }

    /// Decodes exactly one transaction.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(bytes);
        let tx = Self::decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(TransactionError::Malformed(format!(
                "{} trailing bytes",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    pub fn total_inputs(&self) -> Result<u64, TransactionError> {
        sum(&self.inputs)
    }

    /// Factoid and entry-credit outputs together.
    pub fn total_outputs(&self) -> Result<u64, TransactionError> {
        sum(&self.outputs)?
            .checked_add(sum(&self.ec_outputs)?)
            .ok_or(TransactionError::AmountOverflow)
    }

    /// Whether `address` appears as an input, output, or EC output.
    pub fn involves(&self, address: &Address) -> bool {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .chain(&self.ec_outputs)
            .any(|io| io.address == *address)
    }

    pub fn is_fully_signed(&self) -> bool {
        self.auths.len() == self.inputs.len()
    }
}

fn sum(list: &[TxAddress]) -> Result<u64, TransactionError> {
    list.iter()
        .try_fold(0u64, |acc, io| acc.checked_add(io.amount))
        .ok_or(TransactionError::AmountOverflow)
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.txid() {
            Ok(id) => writeln!(f, "  txid:      {id}")?,
            Err(_) => writeln!(f, "  txid:      <unencodable>")?,
        }
        writeln!(f, "  version:   {}", self.version)?;
        writeln!(f, "  timestamp: {}", self.timestamp)?;

        let sections = [
            ("input", &self.inputs, AddressKind::Factoid),
            ("output", &self.outputs, AddressKind::Factoid),
            ("ec output", &self.ec_outputs, AddressKind::EntryCredit),
        ];
        for (label, list, kind) in sections {
            writeln!(f, "  {label}s: {}", list.len())?;
            for io in list {
                writeln!(
                    f,
                    "    {:>20} {}",
                    format_fixed_point(io.amount),
                    io.address.to_user_string(kind)
                )?;
            }
        }
        write!(
            f,
            "  signed:    {}/{}",
            self.auths.len(),
            self.inputs.len()
        )
    }
}

//! Directory and factoid block codecs.
//!
//! Only what the scanner reads is modelled. Both blocks are fetched from the
//! node as raw bytes and decoded here.
//!
//! ```text
//! DirectoryBlock
//!   version(1) ‖ network_id(4) ‖ body_mr(32) ‖ prev_key_mr(32)
//!   ‖ prev_full_hash(32) ‖ timestamp(4) ‖ height(4) ‖ count(4)
//!   ‖ count × (chain_id(32) ‖ key_mr(32))
//!
//! FactoidBlock
//!   chain_id(32) ‖ body_mr(32) ‖ prev_key_mr(32) ‖ prev_ledger_key_mr(32)
//!   ‖ exchange_rate(8) ‖ height(4) ‖ expansion_len(varint) ‖ expansion
//!   ‖ tx_count(4) ‖ body_size(4) ‖ transactions
//! ```

use super::ScanError;
use crate::codec::{write_varint, Reader};
use crate::config::FACTOID_CHAIN_ID;
use crate::crypto::Hash;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Directory Block
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryHeader {
    pub version: u8,
    pub network_id: u32,
    pub body_mr: Hash,
    pub prev_key_mr: Hash,
    pub prev_full_hash: Hash,
    pub timestamp: u32,
    pub height: u32,
}

/// One chain's block as referenced from a directory block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub chain_id: Hash,
    pub key_mr: Hash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBlock {
    pub header: DirectoryHeader,
    pub entries: Vec<DirectoryEntry>,
}

impl DirectoryBlock {
    pub fn to_bytes(&self) -> Vec<u8> {
        let h = &self.header;
        let mut buf = Vec::with_capacity(113 + 64 * self.entries.len());
        buf.push(h.version);
        buf.extend_from_slice(&h.network_id.to_be_bytes());
        buf.extend_from_slice(h.body_mr.as_bytes());
        buf.extend_from_slice(h.prev_key_mr.as_bytes());
        buf.extend_from_slice(h.prev_full_hash.as_bytes());
        buf.extend_from_slice(&h.timestamp.to_be_bytes());
        buf.extend_from_slice(&h.height.to_be_bytes());
        buf.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for entry in &self.entries {
            buf.extend_from_slice(entry.chain_id.as_bytes());
            buf.extend_from_slice(entry.key_mr.as_bytes());
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScanError> {
        let mut r = Reader::new(bytes);
        let header = DirectoryHeader {
            version: r.read_u8()?,
            network_id: r.read_u32()?,
            body_mr: Hash::new(r.read_hash()?),
            prev_key_mr: Hash::new(r.read_hash()?),
            prev_full_hash: Hash::new(r.read_hash()?),
            timestamp: r.read_u32()?,
            height: r.read_u32()?,
        };
        let count = r.read_u32()? as usize;
        // Each entry is 64 bytes; refuse counts the input cannot hold before
        // allocating for them.
        if count > r.remaining() / 64 {
            return Err(ScanError::Malformed(format!(
                "directory block claims {count} entries in {} bytes",
                r.remaining()
            )));
        }
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(DirectoryEntry {
                chain_id: Hash::new(r.read_hash()?),
                key_mr: Hash::new(r.read_hash()?),
            });
        }
        Ok(Self { header, entries })
    }

    /// KeyMR of the factoid block this directory block references.
    ///
    /// Exactly one factoid chain entry is allowed; none or several means the
    /// block is corrupt.
    pub fn factoid_block_key_mr(&self) -> Result<Hash, ScanError> {
        let mut found = self
            .entries
            .iter()
            .filter(|e| e.chain_id.as_bytes() == &FACTOID_CHAIN_ID);
        match (found.next(), found.next()) {
            (Some(entry), None) => Ok(entry.key_mr),
            (None, _) => Err(ScanError::Integrity(format!(
                "directory block at height {} has no factoid block",
                self.header.height
            ))),
            (Some(_), Some(_)) => Err(ScanError::Integrity(format!(
                "directory block at height {} has more than one factoid block",
                self.header.height
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Factoid Block
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoidBlock {
    pub body_mr: Hash,
    pub prev_key_mr: Hash,
    pub prev_ledger_key_mr: Hash,
    pub exchange_rate: u64,
    pub height: u32,
    pub header_expansion: Vec<u8>,
    /// Index 0 is the block's coinbase transaction.
    pub transactions: Vec<Transaction>,
}

impl FactoidBlock {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ScanError> {
        let mut body = Vec::new();
        for tx in &self.transactions {
            body.extend_from_slice(&tx.to_bytes().map_err(|e| ScanError::Malformed(e.to_string()))?);
        }

        let mut buf = Vec::with_capacity(150 + self.header_expansion.len() + body.len());
        buf.extend_from_slice(&FACTOID_CHAIN_ID);
        buf.extend_from_slice(self.body_mr.as_bytes());
        buf.extend_from_slice(self.prev_key_mr.as_bytes());
        buf.extend_from_slice(self.prev_ledger_key_mr.as_bytes());
        buf.extend_from_slice(&self.exchange_rate.to_be_bytes());
        buf.extend_from_slice(&self.height.to_be_bytes());
        write_varint(&mut buf, self.header_expansion.len() as u64);
        buf.extend_from_slice(&self.header_expansion);
        buf.extend_from_slice(&(self.transactions.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScanError> {
        let mut r = Reader::new(bytes);
        let chain_id = r.read_hash()?;
        if chain_id != FACTOID_CHAIN_ID {
            return Err(ScanError::Malformed(format!(
                "not a factoid block (chain {})",
                hex::encode(chain_id)
            )));
        }
        let body_mr = Hash::new(r.read_hash()?);
        let prev_key_mr = Hash::new(r.read_hash()?);
        let prev_ledger_key_mr = Hash::new(r.read_hash()?);
        let exchange_rate = r.read_u64()?;
        let height = r.read_u32()?;

        let expansion_len = usize::try_from(r.read_varint()?)
            .map_err(|_| ScanError::Malformed("header expansion too large".into()))?;
        let header_expansion = r.read_bytes(expansion_len)?.to_vec();

        let tx_count = r.read_u32()? as usize;
        let body_size = r.read_u32()? as usize;
        let body = r.read_bytes(body_size)?;
        if !r.is_empty() {
            return Err(ScanError::Malformed(format!(
                "{} bytes after factoid block body",
                r.remaining()
            )));
        }

        let mut body_reader = Reader::new(body);
        let mut transactions = Vec::new();
        for index in 0..tx_count {
            let tx = Transaction::decode(&mut body_reader).map_err(|e| {
                ScanError::Malformed(format!("transaction {index} at height {height}: {e}"))
            })?;
            transactions.push(tx);
        }
        if !body_reader.is_empty() {
            return Err(ScanError::Malformed(format!(
                "factoid block body has {} unread bytes",
                body_reader.remaining()
            )));
        }

        Ok(Self {
            body_mr,
            prev_key_mr,
            prev_ledger_key_mr,
            exchange_rate,
            height,
            header_expansion,
            transactions,
        })
    }
}

//! Minimum fee calculation.
//!
//! A fee is a number of units priced at the entry-credit rate:
//!
//! ```text
//! units = ceil(size / 1024) + 10 × (outputs + ec_outputs) + inputs
//! fee   = units × ec_rate
//! ```
//!
//! `size` is the size the transaction will have once every input carries a
//! single-key authorisation, so signing never pushes a transaction below its
//! own minimum.

use super::{Transaction, TransactionError};
use crate::config::{FEE_UNITS_PER_KB, FEE_UNITS_PER_OUTPUT, FEE_UNITS_PER_SIGNATURE, SIGNATURE_LENGTH};
use crate::credential::Rcd;

const KILOBYTE: usize = 1024;

/// Encoded size of one single-key authorisation block.
fn single_auth_size() -> usize {
    Rcd::single([0u8; 32]).to_bytes().len() + 1 + SIGNATURE_LENGTH
}

/// Size of `tx` once fully signed with single-key conditions.
pub fn signed_size(tx: &Transaction) -> Result<usize, TransactionError> {
    Ok(tx.signable_bytes()?.len() + 1 + tx.inputs.len() * single_auth_size())
}

/// Fee units `tx` owes.
pub fn fee_units(tx: &Transaction) -> Result<u64, TransactionError> {
    let size = signed_size(tx)?;
    let kilobytes = size.div_ceil(KILOBYTE) as u64;
    let outputs = (tx.outputs.len() + tx.ec_outputs.len()) as u64;
    let inputs = tx.inputs.len() as u64;
    Ok(kilobytes * FEE_UNITS_PER_KB
        + outputs * FEE_UNITS_PER_OUTPUT
        + inputs * FEE_UNITS_PER_SIGNATURE)
}

/// Minimum fee in factoshis at `ec_rate` factoshis per unit.
pub fn minimum_fee(tx: &Transaction, ec_rate: u64) -> Result<u64, TransactionError> {
    fee_units(tx)?
        .checked_mul(ec_rate)
        .ok_or(TransactionError::AmountOverflow)
}

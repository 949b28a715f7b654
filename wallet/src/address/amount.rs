//! Fixed-point decimal amounts.
//!
//! Callers type factoid amounts as decimals (`"12.5"`); the protocol only
//! ever sees integer factoshis. The conversion is pure string arithmetic so
//! no floating point ever touches a monetary value.

use thiserror::Error;

use crate::config::{FACTOID_DECIMALS, FACTOSHIS_PER_FACTOID};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("malformed amount '{0}'")]
    Malformed(String),

    #[error("amount '{0}' has more than 8 decimal places")]
    TooPrecise(String),

    #[error("amount '{0}' does not fit in 64 bits")]
    Overflow(String),
}

/// Parses a non-negative decimal into factoshis.
///
/// Accepts `"3"`, `"3."`, `"3.25"` and `".25"`; rejects signs, exponents,
/// whitespace, and more than eight fractional digits.
///
/// ```
/// use factoid_wallet::address::parse_fixed_point;
///
/// assert_eq!(parse_fixed_point("1.5").unwrap(), 150_000_000);
/// ```
pub fn parse_fixed_point(text: &str) -> Result<u64, AmountError> {
    if text.is_empty() {
        return Err(AmountError::Empty);
    }
    let malformed = || AmountError::Malformed(text.to_string());

    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(malformed());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    if frac.len() > FACTOID_DECIMALS as usize {
        return Err(AmountError::TooPrecise(text.to_string()));
    }

    let overflow = || AmountError::Overflow(text.to_string());
    let whole_value: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac_value: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = FACTOID_DECIMALS as usize);
        padded.parse().map_err(|_| malformed())?
    };

    whole_value
        .checked_mul(FACTOSHIS_PER_FACTOID)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(overflow)
}

/// Renders factoshis as a decimal with all eight places, e.g. `1.50000000`.
pub fn format_fixed_point(factoshis: u64) -> String {
    format!(
        "{}.{:0>width$}",
        factoshis / FACTOSHIS_PER_FACTOID,
        factoshis % FACTOSHIS_PER_FACTOID,
        width = FACTOID_DECIMALS as usize
    )
}

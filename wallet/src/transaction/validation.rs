//! Local transaction checks run before signing and before submission.
//!
//! Two independent passes:
//!
//! 1. [`validate`]: structure and balance: at least one input, no amount
//!    overflow, and inputs covering outputs plus the minimum fee.
//! 2. [`validate_signatures`]: every input carries an authorisation whose
//!    condition hashes to the input address and whose signatures verify
//!    over the signable bytes.

use tracing::debug;

use super::{fee::minimum_fee, Transaction, TransactionError};

/// Structural and balance checks.
pub fn validate(tx: &Transaction, ec_rate: u64) -> Result<(), TransactionError> {
    if tx.inputs.is_empty() {
        return Err(TransactionError::NoInputs);
    }

    let inputs = tx.total_inputs()?;
    let outputs = tx.total_outputs()?;
    let fee = minimum_fee(tx, ec_rate)?;
    let required = outputs
        .checked_add(fee)
        .ok_or(TransactionError::AmountOverflow)?;

    if inputs < required {
        return Err(TransactionError::InsufficientFee {
            inputs,
            outputs,
            fee,
        });
    }
    debug!(inputs, outputs, fee, "transaction balance ok");
    Ok(())
}

/// Checks that every input is authorised.
pub fn validate_signatures(tx: &Transaction) -> Result<(), TransactionError> {
    let message = tx.signable_bytes()?;
    for (index, input) in tx.inputs.iter().enumerate() {
        let auth = tx
            .auths
            .get(index)
            .ok_or(TransactionError::MissingSignature { index })?;
        if auth.rcd.address() != input.address {
            return Err(TransactionError::RcdMismatch { index });
        }
        if !auth.rcd.verify(&message, &auth.signatures) {
            return Err(TransactionError::InvalidSignature { index });
        }
    }
    if tx.auths.len() > tx.inputs.len() {
        return Err(TransactionError::Malformed(format!(
            "{} authorisations for {} inputs",
            tx.auths.len(),
            tx.inputs.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::credential::Rcd;
    use crate::crypto::Keypair;
    use crate::transaction::{AuthBlock, TxAddress};

    const RATE: u64 = 1000;

    fn funded(keypair: &Keypair, input: u64, output: u64) -> Transaction {
        let rcd = Rcd::single(keypair.public_key_bytes());
        let mut tx = Transaction::new(42);
        tx.inputs.push(TxAddress::new(rcd.address(), input));
        tx.outputs.push(TxAddress::new(Address::new([9; 32]), output));
        tx
    }

    fn sign_all(tx: &mut Transaction, keypair: &Keypair) {
        let msg = tx.signable_bytes().unwrap();
        tx.auths = tx
            .inputs
            .iter()
            .map(|_| AuthBlock {
                rcd: Rcd::single(keypair.public_key_bytes()),
                signatures: vec![keypair.sign(&msg)],
            })
            .collect();
    }

    #[test]
    fn empty_transaction_has_no_inputs() {
        assert!(matches!(
            validate(&Transaction::new(0), RATE),
            Err(TransactionError::NoInputs)
        ));
    }

    #[test]
    fn exact_fee_passes_and_one_less_fails() {
        let kp = Keypair::generate();
        let probe = funded(&kp, 0, 100);
        let fee = minimum_fee(&probe, RATE).unwrap();

        assert!(validate(&funded(&kp, 100 + fee, 100), RATE).is_ok());
        assert!(matches!(
            validate(&funded(&kp, 100 + fee - 1, 100), RATE),
            Err(TransactionError::InsufficientFee { .. })
        ));
    }

    #[test]
    fn output_equal_to_input_lacks_fee() {
        let kp = Keypair::generate();
        assert!(matches!(
            validate(&funded(&kp, 100, 100), RATE),
            Err(TransactionError::InsufficientFee { inputs: 100, outputs: 100, .. })
        ));
    }

    #[test]
    fn unsigned_input_is_reported_by_index() {
        let kp = Keypair::generate();
        assert!(matches!(
            validate_signatures(&funded(&kp, 1_000_000, 1)),
            Err(TransactionError::MissingSignature { index: 0 })
        ));
    }

    #[test]
    fn valid_signatures_pass() {
        let kp = Keypair::generate();
        let mut tx = funded(&kp, 1_000_000, 1);
        sign_all(&mut tx, &kp);
        assert!(validate_signatures(&tx).is_ok());
    }

    #[test]
    fn signature_from_other_key_is_a_mismatch() {
        let owner = Keypair::generate();
        let thief = Keypair::generate();
        let mut tx = funded(&owner, 1_000_000, 1);
        sign_all(&mut tx, &thief);
        assert!(matches!(
            validate_signatures(&tx),
            Err(TransactionError::RcdMismatch { index: 0 })
        ));
    }

    #[test]
    fn edit_after_signing_invalidates() {
        let kp = Keypair::generate();
        let mut tx = funded(&kp, 1_000_000, 1);
        sign_all(&mut tx, &kp);
        tx.outputs[0].amount = 2;
        assert!(matches!(
            validate_signatures(&tx),
            Err(TransactionError::InvalidSignature { index: 0 })
        ));
    }
}

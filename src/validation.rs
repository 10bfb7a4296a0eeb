use crate::{Ed25519Verifier, SignatureVerifier, Transaction, Utxo, UtxoPool};
use std::collections::HashSet;
use thiserror::Error;

/// The first rule a transaction was found to break.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum InvalidTransaction {
    #[error("Input {0} spends an output that is not in the UTXO pool")]
    MissingUtxo(Utxo),

    #[error("Input {0} is not signed by the recipient of the output it spends")]
    InvalidSignature(Utxo),

    #[error("Output {0} is claimed multiple times")]
    DoubleSpend(Utxo),

    #[error("Output at index {0} has a negative amount: {1}")]
    NegativeOutput(usize, i64),

    #[error("Outputs: {outputs} exceed inputs: {inputs}")]
    InsufficientInputs { inputs: i128, outputs: i128 },
}

/// Responsible for checking a single transaction against a UTXO pool.
/// A transaction is valid iff:
///   - every output it spends is in the pool,
///   - every input is signed by the recipient of the output it spends,
///   - no output is spent more than once,
///   - no output amount is negative,
///   - the amounts it spends cover the amounts it creates.
/// The pool is only read, never modified.
#[derive(Debug, Default, Clone)]
pub struct TransactionValidator<V = Ed25519Verifier> {
    verifier: V,
}

impl<V: SignatureVerifier> TransactionValidator<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    pub fn is_valid(&self, transaction: &Transaction, utxo_pool: &UtxoPool) -> bool {
        self.validate(transaction, utxo_pool).is_ok()
    }

    /// Runs the checks in order and reports the first one that fails.
    pub fn validate(
        &self,
        transaction: &Transaction,
        utxo_pool: &UtxoPool,
    ) -> Result<(), InvalidTransaction> {
        Self::validate_all_inputs_exist(transaction, utxo_pool)?;
        self.validate_signatures(transaction, utxo_pool)?;
        Self::validate_no_double_spend(transaction)?;
        Self::validate_outputs_non_negative(transaction)?;
        Self::validate_inputs_cover_outputs(transaction, utxo_pool)
    }

    fn validate_all_inputs_exist(
        transaction: &Transaction,
        utxo_pool: &UtxoPool,
    ) -> Result<(), InvalidTransaction> {
        match transaction
            .inputs()
            .iter()
            .map(Utxo::from)
            .find(|utxo| !utxo_pool.contains(utxo))
        {
            Some(utxo) => Err(InvalidTransaction::MissingUtxo(utxo)),
            None => Ok(()),
        }
    }

    fn validate_signatures(
        &self,
        transaction: &Transaction,
        utxo_pool: &UtxoPool,
    ) -> Result<(), InvalidTransaction> {
        for (input, payload) in transaction.signed_inputs() {
            let utxo = Utxo::from(input);
            // A missing output can't be looked up, so it can't be signed for either.
            let output = utxo_pool
                .get(&utxo)
                .ok_or(InvalidTransaction::MissingUtxo(utxo))?;
            if !self
                .verifier
                .verify(output.recipient(), &payload, input.signature())
            {
                return Err(InvalidTransaction::InvalidSignature(utxo));
            }
        }
        Ok(())
    }

    fn validate_no_double_spend(transaction: &Transaction) -> Result<(), InvalidTransaction> {
        let mut claimed = HashSet::new();
        for utxo in transaction.inputs().iter().map(Utxo::from) {
            if !claimed.insert(utxo) {
                return Err(InvalidTransaction::DoubleSpend(utxo));
            }
        }
        Ok(())
    }

    fn validate_outputs_non_negative(transaction: &Transaction) -> Result<(), InvalidTransaction> {
        match transaction
            .outputs()
            .iter()
            .enumerate()
            .find(|(_, output)| output.amount() < 0)
        {
            Some((index, output)) => {
                Err(InvalidTransaction::NegativeOutput(index, output.amount()))
            }
            None => Ok(()),
        }
    }

    fn validate_inputs_cover_outputs(
        transaction: &Transaction,
        utxo_pool: &UtxoPool,
    ) -> Result<(), InvalidTransaction> {
        // Summed in i128, so that no number of i64 amounts can overflow.
        let mut inputs: i128 = 0;
        for utxo in transaction.inputs().iter().map(Utxo::from) {
            let output = utxo_pool
                .get(&utxo)
                .ok_or(InvalidTransaction::MissingUtxo(utxo))?;
            inputs += output.amount() as i128;
        }
        let outputs = transaction
            .outputs()
            .iter()
            .map(|output| output.amount() as i128)
            .sum::<i128>();
        if inputs < outputs {
            Err(InvalidTransaction::InsufficientInputs { inputs, outputs })
        } else {
            Ok(())
        }
    }
}

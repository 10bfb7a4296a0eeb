use crate::{OutputIndex, PublicKey, Transaction, TransactionOutput, Utxo};
use std::collections::HashMap;

/// A pool of confirmed and unspent transaction outputs.
/// Iteration order is arbitrary and nothing that decides validity depends on it.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UtxoPool {
    utxos: HashMap<Utxo, TransactionOutput>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool holding every output of the given transaction.
    /// The transaction usually has no inputs and acts as the genesis allocation.
    pub fn from_genesis(genesis: &Transaction) -> Self {
        let mut pool = Self::new();
        pool.add_outputs(genesis);
        pool
    }

    /// Creates a pool holding the outputs of a synthetic genesis transaction paying each
    /// recipient its amount. Returns the pool and the genesis transaction.
    pub fn with_allocations(allocations: &[(PublicKey, i64)]) -> (Self, Transaction) {
        let outputs = allocations
            .iter()
            .map(|(recipient, amount)| TransactionOutput::new(*recipient, *amount))
            .collect();
        let genesis = Transaction::new(vec![], outputs);
        (Self::from_genesis(&genesis), genesis)
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    /// Returns the output referenced by the UTXO, or None when it isn't in the pool.
    pub fn get(&self, utxo: &Utxo) -> Option<&TransactionOutput> {
        self.utxos.get(utxo)
    }

    /// Inserts the output, replacing and returning any output previously stored for the UTXO.
    pub fn add(&mut self, utxo: Utxo, output: TransactionOutput) -> Option<TransactionOutput> {
        self.utxos.insert(utxo, output)
    }

    /// Removes the UTXO from the pool.
    /// Returns the removed output, or None if the UTXO wasn't in the pool, in which case the
    /// pool is left unchanged.
    pub fn remove(&mut self, utxo: &Utxo) -> Option<TransactionOutput> {
        self.utxos.remove(utxo)
    }

    /// Adds all outputs of the transaction, keyed by the transaction id and their position.
    pub fn add_outputs(&mut self, transaction: &Transaction) {
        for (index, output) in transaction.outputs().iter().enumerate() {
            let utxo = Utxo::new(*transaction.id(), OutputIndex::new(index as u32));
            self.add(utxo, output.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utxo, &TransactionOutput)> {
        self.utxos.iter()
    }

    /// Sums the amounts of all unspent outputs.
    pub fn total_amount(&self) -> i128 {
        self.utxos
            .values()
            .map(|output| output.amount() as i128)
            .sum()
    }

    /// Sums the amounts of all unspent outputs owned by the recipient.
    pub fn balance(&self, recipient: &PublicKey) -> i128 {
        self.utxos
            .values()
            .filter(|output| output.recipient() == recipient)
            .map(|output| output.amount() as i128)
            .sum()
    }
}

impl FromIterator<(Utxo, TransactionOutput)> for UtxoPool {
    fn from_iter<T: IntoIterator<Item = (Utxo, TransactionOutput)>>(iter: T) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}

use crate::error::{LedgerError, Result};
use crate::{OutputIndex, PublicKey, Transaction, TransactionId, TransactionOutput, Utxo, UtxoPool};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A single unspent output as stored in a snapshot file.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct UtxoEntry {
    pub utxo_id: TransactionId,
    pub output_index: OutputIndex,
    pub recipient: PublicKey,
    pub amount: i64,
}

/// The on-disk form of a UTXO pool, exchanged with whatever persists the ledger between
/// epochs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Eq, PartialEq)]
pub struct PoolSnapshot {
    pub utxos: Vec<UtxoEntry>,
}

impl PoolSnapshot {
    /// Entries are sorted, so that the same pool always produces the same file.
    pub fn from_pool(utxo_pool: &UtxoPool) -> Self {
        let mut utxos = utxo_pool
            .iter()
            .map(|(utxo, output)| UtxoEntry {
                utxo_id: *utxo.utxo_id(),
                output_index: *utxo.output_index(),
                recipient: *output.recipient(),
                amount: output.amount(),
            })
            .collect::<Vec<UtxoEntry>>();
        utxos.sort_by_key(|entry| (entry.utxo_id, entry.output_index));
        Self { utxos }
    }

    /// Fails if an unspent output is listed twice, rather than keeping only one of them.
    pub fn into_pool(self) -> Result<UtxoPool> {
        let mut utxo_pool = UtxoPool::new();
        for entry in self.utxos {
            let utxo = Utxo::new(entry.utxo_id, entry.output_index);
            let output = TransactionOutput::new(entry.recipient, entry.amount);
            if utxo_pool.add(utxo, output).is_some() {
                return Err(LedgerError::DuplicateUtxo(utxo));
            }
        }
        Ok(utxo_pool)
    }
}

pub fn load_pool(path: &Path) -> Result<UtxoPool> {
    let data = fs::read_to_string(path)?;
    let snapshot: PoolSnapshot = serde_json::from_str(&data)?;
    tracing::debug!(
        "Loaded {} unspent outputs from: {}",
        snapshot.utxos.len(),
        path.display()
    );
    snapshot.into_pool()
}

pub fn save_pool(path: &Path, utxo_pool: &UtxoPool) -> Result<()> {
    let data = serde_json::to_string_pretty(&PoolSnapshot::from_pool(utxo_pool))?;
    fs::write(path, data)?;
    tracing::debug!(
        "Saved {} unspent outputs to: {}",
        utxo_pool.len(),
        path.display()
    );
    Ok(())
}

pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let data = fs::read_to_string(path)?;
    let transactions: Vec<Transaction> = serde_json::from_str(&data)?;
    tracing::debug!(
        "Loaded {} transactions from: {}",
        transactions.len(),
        path.display()
    );
    Ok(transactions)
}

pub fn load_transaction(path: &Path) -> Result<Transaction> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

pub fn save_transactions(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let data = serde_json::to_string_pretty(transactions)?;
    fs::write(path, data)?;
    Ok(())
}

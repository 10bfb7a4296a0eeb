use crate::{OutputIndex, TransactionId, TransactionInput};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A reference to an unspent transaction output: the transaction that produced it and its
/// position among that transaction's outputs.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct Utxo {
    utxo_id: TransactionId,
    output_index: OutputIndex,
}

impl Utxo {
    pub fn new(utxo_id: TransactionId, output_index: OutputIndex) -> Self {
        Self {
            utxo_id,
            output_index,
        }
    }

    pub fn utxo_id(&self) -> &TransactionId {
        &self.utxo_id
    }

    pub fn output_index(&self) -> &OutputIndex {
        &self.output_index
    }
}

impl From<&TransactionInput> for Utxo {
    fn from(input: &TransactionInput) -> Self {
        Self::new(*input.utxo_id(), *input.output_index())
    }
}

impl Display for Utxo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.utxo_id, self.output_index)
    }
}

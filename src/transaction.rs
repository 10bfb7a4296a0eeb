use crate::error::{LedgerError, Result};
use crate::{KeyPair, PublicKey, Sha256, Signature};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// A double SHA-256 hash of the transaction data.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct TransactionId(Sha256);

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionId {
    pub fn new(data: Sha256) -> Self {
        Self(data)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

/// The position of an output in its transaction, the first one is 0.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct OutputIndex(u32);

impl Display for OutputIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OutputIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    // 32 bytes. A pointer to the transaction containing the UTXO to be spent.
    utxo_id: TransactionId,
    // 4 bytes. The number of UTXO to be spent, the first one is 0.
    output_index: OutputIndex,
    // Signs the payload of this input with the key of the referenced output's recipient.
    #[serde(default = "Signature::empty")]
    signature: Signature,
}

impl Display for TransactionInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.utxo_id, self.output_index)
    }
}

impl TransactionInput {
    pub fn new(utxo_id: TransactionId, output_index: OutputIndex, signature: Signature) -> Self {
        Self {
            utxo_id,
            output_index,
            signature,
        }
    }

    pub fn unsigned(utxo_id: TransactionId, output_index: OutputIndex) -> Self {
        Self::new(utxo_id, output_index, Signature::empty())
    }

    pub fn utxo_id(&self) -> &TransactionId {
        &self.utxo_id
    }

    pub fn output_index(&self) -> &OutputIndex {
        &self.output_index
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
    recipient: PublicKey,
    // Signed so that malformed transactions with negative outputs can be represented
    // and rejected.
    amount: i64,
}

impl Display for TransactionOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.recipient, self.amount)
    }
}

impl TransactionOutput {
    pub fn new(recipient: PublicKey, amount: i64) -> Self {
        Self { recipient, amount }
    }

    pub fn recipient(&self) -> &PublicKey {
        &self.recipient
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }
}

/// An ordered list of inputs spending earlier outputs and an ordered list of new outputs.
/// Two transactions are the same transaction iff their ids are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TransactionData", into = "TransactionData")]
pub struct Transaction {
    id: TransactionId,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl Transaction {
    pub fn new(inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>) -> Self {
        let id = Self::hash_transaction_data(&inputs, &outputs);
        Self {
            id,
            inputs,
            outputs,
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn inputs(&self) -> &Vec<TransactionInput> {
        &self.inputs
    }

    pub fn outputs(&self) -> &Vec<TransactionOutput> {
        &self.outputs
    }

    /// Returns the bytes that the input at `index` must sign, or None if there is no such input.
    pub fn signable_payload(&self, index: usize) -> Option<Vec<u8>> {
        self.inputs
            .get(index)
            .map(|input| encode_signable_payload(input, &self.outputs))
    }

    /// Iterates over all inputs together with the payload each of them signs.
    pub fn signed_inputs(&self) -> impl Iterator<Item = (&TransactionInput, Vec<u8>)> + '_ {
        self.inputs
            .iter()
            .map(move |input| (input, encode_signable_payload(input, &self.outputs)))
    }

    fn hash_transaction_data(
        inputs: &[TransactionInput],
        outputs: &[TransactionOutput],
    ) -> TransactionId {
        let mut data = Vec::new();
        for input in inputs {
            encode_input_reference(&mut data, input);
            data.extend_from_slice(input.signature.as_bytes());
        }
        for output in outputs {
            encode_output(&mut data, output);
        }
        TransactionId(Sha256::double_digest(&data))
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Transaction {}

impl Hash for Transaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] -> [{}]",
            self.id,
            self.inputs
                .iter()
                .map(TransactionInput::to_string)
                .collect::<Vec<String>>()
                .join(", "),
            self.outputs
                .iter()
                .map(TransactionOutput::to_string)
                .collect::<Vec<String>>()
                .join(", ")
        )
    }
}

// The serialized form of a transaction. The id is derived data, so it's never trusted from
// the outside and is recomputed when the transaction is decoded.
#[derive(Serialize, Deserialize)]
struct TransactionData {
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl From<TransactionData> for Transaction {
    fn from(data: TransactionData) -> Self {
        Transaction::new(data.inputs, data.outputs)
    }
}

impl From<Transaction> for TransactionData {
    fn from(transaction: Transaction) -> Self {
        Self {
            inputs: transaction.inputs,
            outputs: transaction.outputs,
        }
    }
}

// All fields are serialized using the little-endian format, so the payload doesn't depend on
// the platform.
fn encode_input_reference(data: &mut Vec<u8>, input: &TransactionInput) {
    data.extend_from_slice(input.utxo_id.as_slice());
    data.extend_from_slice(&input.output_index.0.to_le_bytes());
}

fn encode_output(data: &mut Vec<u8>, output: &TransactionOutput) {
    data.extend_from_slice(output.recipient.as_bytes());
    data.extend_from_slice(&output.amount.to_le_bytes());
}

/// The payload signed by an input: the output it spends followed by all outputs of the
/// transaction. Signatures are never part of it.
fn encode_signable_payload(input: &TransactionInput, outputs: &[TransactionOutput]) -> Vec<u8> {
    let mut data = Vec::new();
    encode_input_reference(&mut data, input);
    for output in outputs {
        encode_output(&mut data, output);
    }
    data
}

/// Assembles a transaction whose inputs are signed after all inputs and outputs are known.
/// The transaction id is only computed in `build`, once every field is final.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing transaction, e.g. one that was decoded without signatures.
    pub fn from_transaction(transaction: Transaction) -> Self {
        Self {
            inputs: transaction.inputs,
            outputs: transaction.outputs,
        }
    }

    pub fn add_input(&mut self, utxo_id: TransactionId, output_index: OutputIndex) -> &mut Self {
        self.inputs.push(TransactionInput::unsigned(utxo_id, output_index));
        self
    }

    pub fn add_output(&mut self, recipient: PublicKey, amount: i64) -> &mut Self {
        self.outputs.push(TransactionOutput::new(recipient, amount));
        self
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn signable_payload(&self, index: usize) -> Result<Vec<u8>> {
        self.inputs
            .get(index)
            .map(|input| encode_signable_payload(input, &self.outputs))
            .ok_or(LedgerError::InputIndexOutOfRange {
                index,
                len: self.inputs.len(),
            })
    }

    pub fn set_signature(&mut self, index: usize, signature: Signature) -> Result<&mut Self> {
        let len = self.inputs.len();
        match self.inputs.get_mut(index) {
            Some(input) => {
                input.signature = signature;
                Ok(self)
            }
            None => Err(LedgerError::InputIndexOutOfRange { index, len }),
        }
    }

    pub fn sign_input(&mut self, index: usize, key_pair: &KeyPair) -> Result<&mut Self> {
        let payload = self.signable_payload(index)?;
        self.set_signature(index, key_pair.sign(&payload))
    }

    pub fn build(&self) -> Transaction {
        Transaction::new(self.inputs.clone(), self.outputs.clone())
    }
}

use crate::Utxo;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors raised at the boundaries of the ledger: decoding keys and hashes, reading and writing
/// snapshots, and building transactions.
/// Transaction validation never produces these, it answers with a plain boolean.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid length of {what}. Expected: {expected} but got: {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Input index: {index} is out of range, the transaction has {len} inputs")]
    InputIndexOutOfRange { index: usize, len: usize },

    #[error("Unspent output: {0} is listed more than once")]
    DuplicateUtxo(Utxo),
}

/// Decodes a hex string into a fixed-size byte array.
pub(crate) fn decode_hex_array<const N: usize>(s: &str, what: &'static str) -> Result<[u8; N]> {
    let bytes = hex::decode(s)?;
    if bytes.len() != N {
        return Err(LedgerError::InvalidLength {
            what,
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut array = [0; N];
    array.copy_from_slice(&bytes);
    Ok(array)
}

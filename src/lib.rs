pub mod commands;
pub mod error;
pub mod hash;
pub mod signature;
pub mod snapshot;
pub mod transaction;
pub mod tx_handler;
pub mod utxo;
pub mod utxo_pool;
pub mod validation;

pub use self::{
    error::LedgerError, hash::*, signature::*, transaction::*, tx_handler::*, utxo::*,
    utxo_pool::*, validation::*,
};

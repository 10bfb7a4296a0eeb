use crate::commands::required;
use crate::snapshot::{load_pool, load_transactions, save_pool};
use crate::TxHandler;
use clap::{Arg, ArgMatches, Command};
use std::error::Error;
use std::path::PathBuf;

struct EpochCliOptions {
    utxo_pool: PathBuf,
    transactions: PathBuf,
    output_pool: Option<PathBuf>,
}

impl EpochCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            utxo_pool: PathBuf::from(required(matches, "utxo_pool")?),
            transactions: PathBuf::from(required(matches, "transactions")?),
            output_pool: matches.value_of("output_pool").map(PathBuf::from),
        })
    }
}

pub fn epoch_command() -> Command<'static> {
    Command::new("epoch")
        .version("0.1")
        .about("Accepts a mutually valid subset of the proposed transactions and updates the UTXO pool.")
        .arg(
            Arg::new("utxo_pool")
                .long("utxo-pool")
                .value_name("FILE")
                .help("JSON snapshot of the UTXO pool at the start of the epoch.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("transactions")
                .long("transactions")
                .value_name("FILE")
                .help("JSON array of the proposed transactions.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("output_pool")
                .long("output-pool")
                .value_name("FILE")
                .help("Where to write the UTXO pool at the end of the epoch.")
                .takes_value(true)
                .required(false),
        )
}

pub fn run_epoch_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let options = EpochCliOptions::parse(matches)?;
    let utxo_pool = load_pool(&options.utxo_pool)?;
    let transactions = load_transactions(&options.transactions)?;

    let mut handler = TxHandler::new(&utxo_pool);
    let accepted = handler.handle_txs(transactions);
    // Accepted transaction ids are printed in the order they were committed.
    for transaction in &accepted {
        println!("{}", transaction.id());
    }

    if let Some(output_pool) = &options.output_pool {
        save_pool(output_pool, handler.utxo_pool())?;
    }
    Ok(())
}

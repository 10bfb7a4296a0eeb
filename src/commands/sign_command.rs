use crate::commands::required;
use crate::snapshot::load_transaction;
use crate::{KeyPair, TransactionBuilder};
use clap::{Arg, ArgMatches, Command};
use std::error::Error;
use std::path::PathBuf;

struct SignCliOptions {
    transaction: PathBuf,
    key_pair: KeyPair,
    // None means every input.
    inputs: Option<Vec<usize>>,
}

impl SignCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let inputs = match matches.values_of("input") {
            Some(values) => Some(
                values
                    .map(|v| v.parse::<usize>())
                    .collect::<Result<Vec<usize>, _>>()?,
            ),
            None => None,
        };
        Ok(Self {
            transaction: PathBuf::from(required(matches, "transaction")?),
            key_pair: KeyPair::from_secret_hex(required(matches, "secret_key")?)?,
            inputs,
        })
    }
}

pub fn sign_command() -> Command<'static> {
    Command::new("sign")
        .version("0.1")
        .about("Signs the inputs of a transaction and prints the signed transaction as JSON.")
        .arg(
            Arg::new("transaction")
                .long("transaction")
                .value_name("FILE")
                .help("JSON file with the transaction to sign.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("secret_key")
                .long("secret-key")
                .value_name("HEX")
                .help("Hex-encoded Ed25519 secret key of the owner of the spent outputs.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .value_name("INDEX")
                .help("Index of an input to sign. All inputs are signed if omitted.")
                .multiple_occurrences(true)
                .use_value_delimiter(true)
                .takes_value(true)
                .required(false),
        )
}

pub fn run_sign_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let options = SignCliOptions::parse(matches)?;
    let mut builder = TransactionBuilder::from_transaction(load_transaction(&options.transaction)?);
    let inputs = match options.inputs {
        Some(inputs) => inputs,
        None => (0..builder.num_inputs()).collect(),
    };
    for index in inputs {
        builder.sign_input(index, &options.key_pair)?;
    }
    let transaction = builder.build();
    tracing::info!("Signed transaction: {}", transaction.id());
    println!("{}", serde_json::to_string_pretty(&transaction)?);
    Ok(())
}

use clap::{Arg, Command};
use std::error::Error;
use tracing::Level;

fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("scroogecoin")
        .about("ScroogeCoin ledger CLI tools.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increases logging verbosity, -v for debug and -vv for trace.")
                .multiple_occurrences(true)
                .global(true),
        )
        .subcommand(scroogecoin_lib::commands::keygen_command())
        .subcommand(scroogecoin_lib::commands::sign_command())
        .subcommand(scroogecoin_lib::commands::epoch_command())
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // Logs go to stderr, stdout is reserved for the command output.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Some(matches) = matches.subcommand_matches("keygen") {
        scroogecoin_lib::commands::run_keygen_command(matches)
    } else if let Some(matches) = matches.subcommand_matches("sign") {
        scroogecoin_lib::commands::run_sign_command(matches)
    } else if let Some(matches) = matches.subcommand_matches("epoch") {
        scroogecoin_lib::commands::run_epoch_command(matches)
    } else {
        panic!("Should report help.");
    }
}

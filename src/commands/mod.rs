use clap::ArgMatches;

pub mod epoch_command;
pub mod keygen_command;
pub mod sign_command;

pub use self::{epoch_command::*, keygen_command::*, sign_command::*};

/// Returns the value of an argument that clap already enforces as required.
fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    matches
        .value_of(name)
        .ok_or_else(|| format!("Missing required argument: {}", name))
}

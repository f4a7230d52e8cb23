//! Command dispatch: bridges CLI args -> config -> collector/output.

pub mod check;
pub mod probe;
pub mod serve;

use gridtel_config::Config;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Serve(args) => serve::handle(args, global).await,
        Command::Check => check::handle(global),
        Command::Probe(args) => probe::handle(args, global).await,
    }
}

/// Load and validate the config named by `--config`, or the default one.
fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(gridtel_config::load_config(global.config.as_deref())?)
}

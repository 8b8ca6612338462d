//! CLI command implementations

mod binning;
mod gradcheck;

pub use binning::parse_samples;

use crate::cli::{Cli, Command};
use crate::config::{load_config, ProbeConfig};
use crate::error::Result;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<()> {
    let log_level = cli.log_level();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProbeConfig::default(),
    };

    match cli.command {
        Command::Binning(args) => binning::run_binning(&args, config, log_level),
        Command::Gradcheck(args) => gradcheck::run_gradcheck(&args, config, log_level),
    }
}

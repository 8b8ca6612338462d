//! nnprobe CLI
//!
//! # Usage
//!
//! ```bash
//! # Binning statistics of a Monte Carlo energy trace
//! nnprobe binning energies.dat --bins 20
//!
//! # Check a reference layer's gradients
//! nnprobe gradcheck --layer tanh --seed 42
//!
//! # Read defaults from a config file
//! nnprobe --config probe.yaml gradcheck --precision 1e-4
//! ```

use clap::Parser;
use nnprobe::cli::{run_command, Cli};
use nnprobe::telemetry::init_tracing;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level().tracing_filter());

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

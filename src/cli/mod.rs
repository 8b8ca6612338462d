//! CLI module for nnprobe
//!
//! This module contains argument parsing and the command handlers.

mod args;
mod commands;
mod logging;

pub use args::{
    apply_binning_overrides, apply_gradcheck_overrides, parse_args, BinningArgs, Cli, Command,
    GradcheckArgs, LayerKind,
};
pub use commands::{parse_samples, run_command};
pub use logging::{log, LogLevel};

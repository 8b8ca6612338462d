//! Command-line arguments

use crate::cli::LogLevel;
use crate::config::ProbeConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// nnprobe: gradient sanity checks and binning statistics
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "nnprobe")]
#[command(version)]
#[command(about = "Gradient sanity checks and binning statistics for neural-network experiments")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// YAML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Quiet
        } else if self.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Binning statistics of a sample series (one sample per line, `re` or `re im`)
    Binning(BinningArgs),

    /// Check a reference layer's backward pass against finite differences
    Gradcheck(GradcheckArgs),
}

/// Arguments for the binning command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct BinningArgs {
    /// File with one sample per line
    #[arg(value_name = "FILE")]
    pub samples: PathBuf,

    /// Override number of bins
    #[arg(short, long)]
    pub bins: Option<usize>,
}

/// Reference layers available to the gradcheck command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Square,
    Tanh,
    Linear,
}

/// Arguments for the gradcheck command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct GradcheckArgs {
    /// Layer to check
    #[arg(short, long, value_enum, default_value_t = LayerKind::Linear)]
    pub layer: LayerKind,

    /// Override perturbation width
    #[arg(long)]
    pub delta: Option<f64>,

    /// Override tolerated absolute error
    #[arg(long)]
    pub precision: Option<f64>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Rows in the random input
    #[arg(long, default_value_t = 4)]
    pub batch: usize,

    /// Input features (columns)
    #[arg(long, default_value_t = 3)]
    pub in_features: usize,

    /// Output features (linear layer only)
    #[arg(long, default_value_t = 2)]
    pub out_features: usize,
}

/// Parse arguments without exiting the process on error.
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply gradcheck command-line overrides to a loaded configuration.
pub fn apply_gradcheck_overrides(config: &mut ProbeConfig, args: &GradcheckArgs) {
    if let Some(delta) = args.delta {
        config.gradcheck.delta = delta;
    }
    if let Some(precision) = args.precision {
        config.gradcheck.precision = precision;
    }
    if let Some(seed) = args.seed {
        config.gradcheck.seed = Some(seed);
    }
}

/// Apply binning command-line overrides to a loaded configuration.
pub fn apply_binning_overrides(config: &mut ProbeConfig, args: &BinningArgs) {
    if let Some(bins) = args.bins {
        config.binning.num_bins = bins;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binning_command() {
        let cli = parse_args(["nnprobe", "binning", "energy.dat", "--bins", "8"]).unwrap();
        match cli.command {
            Command::Binning(ref args) => {
                assert_eq!(args.samples, PathBuf::from("energy.dat"));
                assert_eq!(args.bins, Some(8));
            }
            _ => panic!("Expected Binning command"),
        }
        assert_eq!(cli.log_level(), LogLevel::Normal);
    }

    #[test]
    fn test_parse_gradcheck_defaults() {
        let cli = parse_args(["nnprobe", "gradcheck"]).unwrap();
        match cli.command {
            Command::Gradcheck(args) => {
                assert_eq!(args.layer, LayerKind::Linear);
                assert_eq!(args.batch, 4);
                assert!(args.delta.is_none());
            }
            _ => panic!("Expected Gradcheck command"),
        }
    }

    #[test]
    fn test_parse_gradcheck_overrides() {
        let cli = parse_args([
            "nnprobe", "gradcheck", "--layer", "tanh", "--delta", "0.001", "--seed", "7", "-v",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), LogLevel::Verbose);
        let Command::Gradcheck(args) = cli.command else {
            panic!("Expected Gradcheck command");
        };
        assert_eq!(args.layer, LayerKind::Tanh);

        let mut config = ProbeConfig::default();
        apply_gradcheck_overrides(&mut config, &args);
        assert_eq!(config.gradcheck.delta, 0.001);
        assert_eq!(config.gradcheck.precision, 1e-3);
        assert_eq!(config.gradcheck.seed, Some(7));
    }

    #[test]
    fn test_binning_override() {
        let args = BinningArgs { samples: PathBuf::from("x"), bins: Some(5) };
        let mut config = ProbeConfig::default();
        apply_binning_overrides(&mut config, &args);
        assert_eq!(config.binning.num_bins, 5);
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let cli = parse_args(["nnprobe", "-q", "-v", "gradcheck"]).unwrap();
        assert_eq!(cli.log_level(), LogLevel::Quiet);
    }

    #[test]
    fn test_unknown_layer_rejected() {
        assert!(parse_args(["nnprobe", "gradcheck", "--layer", "conv"]).is_err());
    }
}

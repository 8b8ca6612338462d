//! nnprobe: numerical sanity tooling for neural-network experiments
//!
//! # Modules
//!
//! - `gradcheck`: finite-difference validation of hand-written layer gradients
//! - `stats`: binning statistics for correlated (Monte Carlo) sample series
//! - `sampling`: Bernoulli masks and typed Gaussian arrays
//! - `periodic`: convolution with periodic boundary conditions
//! - `config`: YAML configuration for the CLI
//!
//! # Example
//!
//! ```
//! use nnprobe::gradcheck::{check_layer_with_rng, CheckConfig};
//! use nnprobe::layers::Square;
//! use ndarray::ArrayD;
//! use rand::SeedableRng;
//!
//! let mut layer = Square::new();
//! let mut x = ArrayD::from_shape_vec(vec![3], vec![0.5, -1.0, 2.0]).unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! let report = check_layer_with_rng(&mut layer, &mut x, &(), &CheckConfig::default(), &mut rng)
//!     .expect("square layer gradients are exact");
//! assert_eq!(report.variables.len(), 1);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod gradcheck;
pub mod layers;
pub mod periodic;
pub mod sampling;
pub mod stats;
pub mod telemetry;

pub use error::{Error, Result};
pub use gradcheck::{
    check_layer, check_layer_with_rng, numerical_gradient, CheckConfig, GradientReport, Layer,
    LayerError, Variable,
};
pub use stats::{binning_statistics, BinningStats};

//! Finite-difference gradient checking for hand-written layers
//!
//! A layer implements [`Layer`]: forward, backward, and indexed access to its
//! parameter arrays and their gradients. [`check_layer`] compares the layer's
//! analytic gradients with central-difference estimates from
//! [`numerical_gradient`].
//!
//! ```
//! use nnprobe::gradcheck::{numerical_gradient, Variable};
//! use nnprobe::layers::Square;
//! use ndarray::{ArrayD, IxDyn};
//!
//! let mut layer = Square::new();
//! let mut x = ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, -3.0]).unwrap();
//! let ones = ArrayD::ones(IxDyn(&[2]));
//!
//! let grad = numerical_gradient(&mut layer, &mut x, &(), Variable::Input, &ones, 1e-3).unwrap();
//! assert!((grad[0] - 2.0).abs() < 1e-6);
//! assert!((grad[1] + 6.0).abs() < 1e-6);
//! ```

mod check;
mod layer;
mod probe;

#[cfg(test)]
mod tests;

pub use check::{check_layer, check_layer_with_rng, CheckConfig, GradientReport, VariableReport};
pub use layer::{Layer, LayerError, Variable};
pub use probe::{flatten, numerical_gradient, variable_len};

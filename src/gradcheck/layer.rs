//! Layer contract for gradient checking

use ndarray::ArrayD;
use std::fmt;
use thiserror::Error;

/// Failure raised by a layer's own forward or backward code.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct LayerError {
    message: String,
}

impl LayerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A differentiable unit with trainable parameter arrays.
///
/// `backward` must be called after `forward` and must leave one gradient
/// array per parameter (same shape, same order) readable through
/// [`Layer::parameter_gradient`].
pub trait Layer {
    /// Extra forward arguments, held constant for a whole check.
    type Args;

    fn forward(&mut self, input: &ArrayD<f64>, args: &Self::Args) -> Result<ArrayD<f64>, LayerError>;

    /// Propagate `grad_output` back to the input of the last forward call.
    fn backward(&mut self, grad_output: &ArrayD<f64>) -> Result<ArrayD<f64>, LayerError>;

    fn num_parameters(&self) -> usize {
        0
    }

    fn parameter(&self, _index: usize) -> Option<&ArrayD<f64>> {
        None
    }

    fn parameter_mut(&mut self, _index: usize) -> Option<&mut ArrayD<f64>> {
        None
    }

    /// Gradient stored by the most recent `backward`.
    fn parameter_gradient(&self, _index: usize) -> Option<&ArrayD<f64>> {
        None
    }

    fn parameter_name(&self, index: usize) -> String {
        format!("parameter[{index}]")
    }
}

/// Which array a numerical gradient is taken with respect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    /// The forward input.
    Input,
    /// The layer's parameter array at this position.
    Parameter(usize),
}

impl Variable {
    /// Human-readable name used in reports and errors.
    pub fn label<L: Layer + ?Sized>(self, layer: &L) -> String {
        match self {
            Self::Input => "input".to_string(),
            Self::Parameter(k) => layer.parameter_name(k),
        }
    }

    /// The input followed by every parameter, in check order.
    pub fn all<L: Layer + ?Sized>(layer: &L) -> Vec<Self> {
        std::iter::once(Self::Input)
            .chain((0..layer.num_parameters()).map(Self::Parameter))
            .collect()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Parameter(k) => write!(f, "parameter[{k}]"),
        }
    }
}

//! Central-difference probing of a single variable
//!
//! Every element is perturbed through a [`Perturbation`] guard. The guard
//! remembers the element's original bits and writes them back when it goes
//! out of scope, so the probed array is restored exactly on every exit path,
//! including a layer failure half way through a probe.

use super::layer::{Layer, Variable};
use crate::error::{Error, Result};
use ndarray::{ArrayD, Zip};
use tracing::trace;

/// Exclusive, scoped write access to one element of the probed variable.
struct Perturbation<'a, L: Layer> {
    layer: &'a mut L,
    input: &'a mut ArrayD<f64>,
    variable: Variable,
    index: usize,
    len: usize,
    original: f64,
}

impl<'a, L: Layer> Perturbation<'a, L> {
    fn acquire(
        layer: &'a mut L,
        input: &'a mut ArrayD<f64>,
        variable: Variable,
        index: usize,
    ) -> Result<Self> {
        let len = variable_len(&*layer, &*input, variable)?;
        let mut probe = Self { layer, input, variable, index, len, original: 0.0 };
        match probe.slot().map(|slot| *slot) {
            Some(original) => {
                probe.original = original;
                Ok(probe)
            }
            None => Err(probe.resized()),
        }
    }

    fn slot(&mut self) -> Option<&mut f64> {
        let array = match self.variable {
            Variable::Input => &mut *self.input,
            Variable::Parameter(k) => self.layer.parameter_mut(k)?,
        };
        array.iter_mut().nth(self.index)
    }

    /// Set the element to `original + offset`.
    fn shift(&mut self, offset: f64) -> Result<()> {
        let value = self.original + offset;
        let written = self.slot().map(|slot| *slot = value).is_some();
        if written {
            Ok(())
        } else {
            Err(self.resized())
        }
    }

    fn forward(&mut self, args: &L::Args) -> Result<ArrayD<f64>> {
        self.layer.forward(&*self.input, args).map_err(|e| {
            Error::layer(
                format!("forward probe of {}[{}]", self.variable.label(&*self.layer), self.index),
                e,
            )
        })
    }

    fn resized(&self) -> Error {
        let actual = match self.variable {
            Variable::Input => self.input.len(),
            Variable::Parameter(k) => self.layer.parameter(k).map_or(0, ArrayD::len),
        };
        Error::ShapeMismatch {
            what: format!("{} while probing", self.variable.label(&*self.layer)),
            expected: vec![self.len],
            actual: vec![actual],
        }
    }
}

impl<L: Layer> Drop for Perturbation<'_, L> {
    fn drop(&mut self) {
        let original = self.original;
        if let Some(slot) = self.slot() {
            *slot = original;
        }
    }
}

/// Number of scalar elements in `variable`.
pub fn variable_len<L: Layer + ?Sized>(
    layer: &L,
    input: &ArrayD<f64>,
    variable: Variable,
) -> Result<usize> {
    match variable {
        Variable::Input => Ok(input.len()),
        Variable::Parameter(k) => layer.parameter(k).map(ArrayD::len).ok_or(
            Error::UnknownParameter { index: k, available: layer.num_parameters() },
        ),
    }
}

/// Flatten an array in logical (row-major) order.
pub fn flatten(array: &ArrayD<f64>) -> Vec<f64> {
    array.iter().copied().collect()
}

/// Estimate d/dv of `sum(forward(input) * grad_output)` for every element v of `variable`.
///
/// Uses the central difference `(y(v + δ/2) - y(v - δ/2)) / δ`, which is
/// accurate to O(δ²). The result has one entry per element of `variable`, in
/// flattened order. The layer's forward pass runs `2 × len(variable)` times.
///
/// # Errors
///
/// - [`Error::InvalidDelta`] if `delta` is not finite and positive
/// - [`Error::UnknownParameter`] if `variable` names a parameter the layer lacks
/// - [`Error::ShapeMismatch`] if `grad_output` does not match the forward output
/// - [`Error::LayerEvaluation`] if the layer fails on a perturbed state; the
///   probed element is still restored before the error is returned
pub fn numerical_gradient<L: Layer>(
    layer: &mut L,
    input: &mut ArrayD<f64>,
    args: &L::Args,
    variable: Variable,
    grad_output: &ArrayD<f64>,
    delta: f64,
) -> Result<Vec<f64>> {
    if !(delta.is_finite() && delta > 0.0) {
        return Err(Error::InvalidDelta(delta));
    }

    let len = variable_len(&*layer, &*input, variable)?;
    let name = variable.label(&*layer);
    let mut gradient = Vec::with_capacity(len);

    for index in 0..len {
        let (y_plus, y_minus) = {
            let mut probe = Perturbation::acquire(layer, input, variable, index)?;
            probe.shift(delta / 2.0)?;
            let y_plus = probe.forward(args)?;
            probe.shift(-delta / 2.0)?;
            let y_minus = probe.forward(args)?;
            (y_plus, y_minus)
        };

        for y in [&y_plus, &y_minus] {
            if y.shape() != grad_output.shape() {
                return Err(Error::ShapeMismatch {
                    what: "output gradient".to_string(),
                    expected: y.shape().to_vec(),
                    actual: grad_output.shape().to_vec(),
                });
            }
        }

        let derivative = Zip::from(&y_plus)
            .and(&y_minus)
            .and(grad_output)
            .fold(0.0, |acc, &plus, &minus, &g| acc + (plus - minus) / delta * g);

        trace!(variable = %name, index, derivative, "probed element");
        gradient.push(derivative);
    }

    Ok(gradient)
}

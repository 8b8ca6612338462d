//! Layer sanity check: analytic vs. numerical gradients

use super::layer::{Layer, Variable};
use super::probe::{flatten, numerical_gradient};
use crate::error::{Error, Result};
use crate::sampling::standard_normal_like;
use ndarray::ArrayD;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Settings for [`check_layer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Perturbation width passed to `numerical_gradient`.
    pub delta: f64,
    /// Maximum tolerated absolute difference per element.
    pub precision: f64,
    /// Seed for the output-gradient draw; `None` uses the thread RNG.
    pub seed: Option<u64>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self { delta: 0.01, precision: 1e-3, seed: None }
    }
}

impl CheckConfig {
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(Error::InvalidDelta(self.delta));
        }
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(Error::InvalidPrecision(self.precision));
        }
        Ok(())
    }
}

/// Outcome for one checked variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableReport {
    pub variable: Variable,
    pub name: String,
    pub numeric: Vec<f64>,
    pub analytic: Vec<f64>,
    pub max_abs_error: f64,
}

/// Outcome of a passing check.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientReport {
    /// Input first, then parameters in layer order.
    pub variables: Vec<VariableReport>,
    pub delta: f64,
    pub precision: f64,
}

impl GradientReport {
    /// Largest absolute difference over every compared element.
    pub fn max_abs_error(&self) -> f64 {
        self.variables.iter().map(|v| v.max_abs_error).fold(0.0, f64::max)
    }

    /// Total number of compared elements.
    pub fn num_checked(&self) -> usize {
        self.variables.iter().map(|v| v.numeric.len()).sum()
    }
}

impl fmt::Display for GradientReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Gradient check passed: {} elements, max |diff| = {:.3e} (delta={}, precision={:e})",
            self.num_checked(),
            self.max_abs_error(),
            self.delta,
            self.precision
        )?;
        for v in &self.variables {
            writeln!(
                f,
                "  {:<16} {:>6} elements  max |diff| = {:.3e}",
                v.name,
                v.numeric.len(),
                v.max_abs_error
            )?;
        }
        Ok(())
    }
}

/// Check a layer's backward pass against central differences.
///
/// Draws the output gradient from a seeded RNG when `config.seed` is set and
/// from the thread RNG otherwise. See [`check_layer_with_rng`].
pub fn check_layer<L: Layer>(
    layer: &mut L,
    input: &mut ArrayD<f64>,
    args: &L::Args,
    config: &CheckConfig,
) -> Result<GradientReport> {
    match config.seed {
        Some(seed) => check_layer_with_rng(layer, input, args, config, &mut StdRng::seed_from_u64(seed)),
        None => check_layer_with_rng(layer, input, args, config, &mut rand::rng()),
    }
}

/// Check a layer's backward pass against central differences.
///
/// Runs forward once, draws a standard-normal output gradient, runs backward
/// and snapshots the input gradient and every parameter gradient. Each of
/// those is then compared element-wise with `numerical_gradient`; the check
/// passes iff every `|numeric - analytic| < precision`.
///
/// # Errors
///
/// Returns [`Error::GradientMismatch`] for the first offending element
/// (input first, then parameters in order), and propagates layer failures as
/// [`Error::LayerEvaluation`].
pub fn check_layer_with_rng<L, R>(
    layer: &mut L,
    input: &mut ArrayD<f64>,
    args: &L::Args,
    config: &CheckConfig,
    rng: &mut R,
) -> Result<GradientReport>
where
    L: Layer,
    R: Rng + ?Sized,
{
    config.validate()?;

    let output = layer.forward(input, args).map_err(|e| Error::layer("forward", e))?;
    let grad_output = standard_normal_like(output.shape(), rng);
    let grad_input = layer.backward(&grad_output).map_err(|e| Error::layer("backward", e))?;

    let mut analytic = Vec::with_capacity(1 + layer.num_parameters());
    for variable in Variable::all(&*layer) {
        let name = variable.label(&*layer);
        let (shape, grad) = match variable {
            Variable::Input => (input.shape().to_vec(), &grad_input),
            Variable::Parameter(k) => {
                let shape = layer.parameter(k).map(|p| p.shape().to_vec()).ok_or(
                    Error::UnknownParameter { index: k, available: layer.num_parameters() },
                )?;
                let grad = layer
                    .parameter_gradient(k)
                    .ok_or_else(|| Error::MissingParameterGradient { variable: name.clone() })?;
                (shape, grad)
            }
        };
        expect_shape(&format!("{name} gradient"), &shape, grad.shape())?;
        analytic.push((variable, flatten(grad)));
    }

    let mut variables = Vec::with_capacity(analytic.len());
    for (variable, analytic) in analytic {
        let name = variable.label(&*layer);
        let numeric = numerical_gradient(layer, input, args, variable, &grad_output, config.delta)?;

        let mut max_abs_error = 0.0_f64;
        for (index, (&n, &a)) in numeric.iter().zip(&analytic).enumerate() {
            let diff = (n - a).abs();
            // NaN must fail, so compare in the passing direction
            if !(diff < config.precision) {
                return Err(Error::GradientMismatch {
                    variable: name,
                    index,
                    numeric: n,
                    analytic: a,
                    diff,
                    precision: config.precision,
                });
            }
            max_abs_error = max_abs_error.max(diff);
        }

        debug!(variable = %name, elements = numeric.len(), max_abs_error, "gradient matches");
        variables.push(VariableReport { variable, name, numeric, analytic, max_abs_error });
    }

    let report = GradientReport { variables, delta: config.delta, precision: config.precision };
    info!(
        elements = report.num_checked(),
        max_abs_error = report.max_abs_error(),
        "gradient check passed"
    );
    Ok(report)
}

fn expect_shape(what: &str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            what: what.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}

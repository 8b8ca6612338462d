//! Reference layers with closed-form gradients
//!
//! These are the layers the CLI self-check runs against, and the known-good
//! baselines the gradient checker is tested with.

use crate::error::{Error, Result};
use crate::gradcheck::{Layer, LayerError};
use crate::sampling::typed_normal;
use ndarray::{Array1, Array2, ArrayD, Axis, Ix1, Ix2, IxDyn};
use rand::Rng;

fn cached<'a>(input: &'a Option<ArrayD<f64>>, layer: &str) -> std::result::Result<&'a ArrayD<f64>, LayerError> {
    input
        .as_ref()
        .ok_or_else(|| LayerError::new(format!("{layer}: backward called before forward")))
}

fn same_shape(layer: &str, expected: &[usize], actual: &[usize]) -> std::result::Result<(), LayerError> {
    if expected == actual {
        Ok(())
    } else {
        Err(LayerError::new(format!(
            "{layer}: output gradient shape {actual:?} does not match output shape {expected:?}"
        )))
    }
}

/// Elementwise `y = x²`.
#[derive(Debug, Clone, Default)]
pub struct Square {
    input: Option<ArrayD<f64>>,
}

impl Square {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for Square {
    type Args = ();

    fn forward(&mut self, input: &ArrayD<f64>, _args: &()) -> std::result::Result<ArrayD<f64>, LayerError> {
        self.input = Some(input.clone());
        Ok(input.mapv(|x| x * x))
    }

    fn backward(&mut self, grad_output: &ArrayD<f64>) -> std::result::Result<ArrayD<f64>, LayerError> {
        let x = cached(&self.input, "square")?;
        same_shape("square", x.shape(), grad_output.shape())?;
        Ok(x * grad_output * 2.0)
    }
}

/// Elementwise `y = tanh(x)`.
#[derive(Debug, Clone, Default)]
pub struct Tanh {
    output: Option<ArrayD<f64>>,
}

impl Tanh {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for Tanh {
    type Args = ();

    fn forward(&mut self, input: &ArrayD<f64>, _args: &()) -> std::result::Result<ArrayD<f64>, LayerError> {
        let y = input.mapv(f64::tanh);
        self.output = Some(y.clone());
        Ok(y)
    }

    fn backward(&mut self, grad_output: &ArrayD<f64>) -> std::result::Result<ArrayD<f64>, LayerError> {
        let y = cached(&self.output, "tanh")?;
        same_shape("tanh", y.shape(), grad_output.shape())?;
        Ok(y.mapv(|v| 1.0 - v * v) * grad_output)
    }
}

/// Fully connected layer: `y = x Wᵀ + b` for `x` of shape `[batch, in]`.
///
/// Parameters are `weight` (`[out, in]`) and `bias` (`[out]`), in that order.
#[derive(Debug, Clone)]
pub struct Linear {
    params: [ArrayD<f64>; 2],
    grads: Option<[ArrayD<f64>; 2]>,
    input: Option<ArrayD<f64>>,
}

impl Linear {
    /// Gaussian init with standard deviation `1/sqrt(in_features)`, zero bias.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Result<Self> {
        if in_features == 0 || out_features == 0 {
            return Err(Error::ConfigValue {
                field: "linear".to_string(),
                message: format!("features must be > 0, got in={in_features}, out={out_features}"),
            });
        }
        let scale = 1.0 / (in_features as f64).sqrt();
        let weight = typed_normal::<f64, _>(&[out_features, in_features], scale, rng)?;
        let bias = ArrayD::zeros(IxDyn(&[out_features]));
        Self::from_parts(weight, bias)
    }

    pub fn from_parts(weight: ArrayD<f64>, bias: ArrayD<f64>) -> Result<Self> {
        if weight.ndim() != 2 || bias.ndim() != 1 || bias.len() != weight.shape()[0] {
            return Err(Error::ShapeMismatch {
                what: "linear bias".to_string(),
                expected: weight.shape().first().map(|&out| vec![out]).unwrap_or_default(),
                actual: bias.shape().to_vec(),
            });
        }
        Ok(Self { params: [weight, bias], grads: None, input: None })
    }

    pub fn in_features(&self) -> usize {
        self.params[0].shape()[1]
    }

    pub fn out_features(&self) -> usize {
        self.params[0].shape()[0]
    }

    fn weight(&self) -> std::result::Result<Array2<f64>, LayerError> {
        self.params[0]
            .clone()
            .into_dimensionality::<Ix2>()
            .map_err(|e| LayerError::new(format!("linear: weight is not 2-D: {e}")))
    }

    fn bias(&self) -> std::result::Result<Array1<f64>, LayerError> {
        self.params[1]
            .clone()
            .into_dimensionality::<Ix1>()
            .map_err(|e| LayerError::new(format!("linear: bias is not 1-D: {e}")))
    }
}

fn as_matrix(array: &ArrayD<f64>, what: &str, cols: usize) -> std::result::Result<Array2<f64>, LayerError> {
    let m = array
        .clone()
        .into_dimensionality::<Ix2>()
        .map_err(|_| LayerError::new(format!("linear: {what} must be 2-D, got shape {:?}", array.shape())))?;
    if m.ncols() != cols {
        return Err(LayerError::new(format!(
            "linear: {what} has {} columns, expected {cols}",
            m.ncols()
        )));
    }
    Ok(m)
}

impl Layer for Linear {
    type Args = ();

    fn forward(&mut self, input: &ArrayD<f64>, _args: &()) -> std::result::Result<ArrayD<f64>, LayerError> {
        let x = as_matrix(input, "input", self.in_features())?;
        let y = x.dot(&self.weight()?.t()) + &self.bias()?;
        self.input = Some(input.clone());
        Ok(y.into_dyn())
    }

    fn backward(&mut self, grad_output: &ArrayD<f64>) -> std::result::Result<ArrayD<f64>, LayerError> {
        let x = as_matrix(cached(&self.input, "linear")?, "input", self.in_features())?;
        let g = as_matrix(grad_output, "output gradient", self.out_features())?;
        if g.nrows() != x.nrows() {
            return Err(LayerError::new(format!(
                "linear: output gradient has {} rows, input batch is {}",
                g.nrows(),
                x.nrows()
            )));
        }

        let grad_weight = g.t().dot(&x);
        let grad_bias = g.sum_axis(Axis(0));
        let grad_input = g.dot(&self.weight()?);

        self.grads = Some([grad_weight.into_dyn(), grad_bias.into_dyn()]);
        Ok(grad_input.into_dyn())
    }

    fn num_parameters(&self) -> usize {
        self.params.len()
    }

    fn parameter(&self, index: usize) -> Option<&ArrayD<f64>> {
        self.params.get(index)
    }

    fn parameter_mut(&mut self, index: usize) -> Option<&mut ArrayD<f64>> {
        self.params.get_mut(index)
    }

    fn parameter_gradient(&self, index: usize) -> Option<&ArrayD<f64>> {
        self.grads.as_ref().and_then(|g| g.get(index))
    }

    fn parameter_name(&self, index: usize) -> String {
        match index {
            0 => "weight".to_string(),
            1 => "bias".to_string(),
            k => format!("parameter[{k}]"),
        }
    }
}

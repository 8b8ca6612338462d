//! Random array generation
//!
//! - `sample_prob`: Bernoulli mask with per-element probabilities
//! - `typed_normal`: Gaussian arrays for real or complex element types
//! - `standard_normal_like`: N(0, 1) array of a given shape

use crate::error::{Error, Result};
use ndarray::{ArrayD, IxDyn};
use num_complex::{Complex32, Complex64};
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

/// Element types that `typed_normal` can produce.
pub trait NormalElement: Sized {
    /// Draw one element. Complex types draw both parts independently.
    fn draw<R: Rng + ?Sized>(normal: &Normal<f64>, rng: &mut R) -> Self;
}

impl NormalElement for f64 {
    fn draw<R: Rng + ?Sized>(normal: &Normal<f64>, rng: &mut R) -> Self {
        normal.sample(rng)
    }
}

impl NormalElement for f32 {
    fn draw<R: Rng + ?Sized>(normal: &Normal<f64>, rng: &mut R) -> Self {
        normal.sample(rng) as f32
    }
}

impl NormalElement for Complex64 {
    fn draw<R: Rng + ?Sized>(normal: &Normal<f64>, rng: &mut R) -> Self {
        let re = normal.sample(rng);
        let im = normal.sample(rng);
        Complex64::new(re, im)
    }
}

impl NormalElement for Complex32 {
    fn draw<R: Rng + ?Sized>(normal: &Normal<f64>, rng: &mut R) -> Self {
        let re = normal.sample(rng) as f32;
        let im = normal.sample(rng) as f32;
        Complex32::new(re, im)
    }
}

/// Gaussian array with mean 0 and standard deviation `scale`, typed by `T`.
///
/// ```
/// use nnprobe::sampling::typed_normal;
/// use num_complex::Complex64;
///
/// let mut rng = rand::rng();
/// let z = typed_normal::<Complex64, _>(&[2, 3], 0.5, &mut rng).unwrap();
/// assert_eq!(z.shape(), &[2, 3]);
/// ```
pub fn typed_normal<T, R>(shape: &[usize], scale: f64, rng: &mut R) -> Result<ArrayD<T>>
where
    T: NormalElement,
    R: Rng + ?Sized,
{
    if !(scale.is_finite() && scale >= 0.0) {
        return Err(Error::InvalidScale(scale));
    }
    let normal = Normal::new(0.0, scale).map_err(|_| Error::InvalidScale(scale))?;
    Ok(ArrayD::from_shape_simple_fn(IxDyn(shape), || T::draw(&normal, rng)))
}

/// N(0, 1) array of the given shape.
pub fn standard_normal_like<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> ArrayD<f64> {
    ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.sample(StandardNormal))
}

/// 1.0 with probability `p`, 0.0 otherwise, elementwise.
///
/// Probabilities at or below 0 never fire, at or above 1 always fire.
pub fn sample_prob<R: Rng + ?Sized>(probs: &ArrayD<f64>, rng: &mut R) -> ArrayD<f64> {
    probs.mapv(|p| {
        let u: f64 = rng.random();
        if p > u {
            1.0
        } else {
            0.0
        }
    })
}

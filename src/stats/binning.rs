//! Binning analysis of Monte Carlo observables
//!
//! Consecutive samples of a Markov chain are correlated, so the naive
//! standard error underestimates the true uncertainty. Averaging contiguous
//! blocks and measuring the spread of the block means gives a corrected
//! error bar and an estimate of the autocorrelation time.

use crate::error::{Error, Result};
use num_complex::Complex;
use std::fmt;
use tracing::info;

/// Sample types whose real part enters the statistics.
pub trait Observable: Copy {
    fn real_part(self) -> f64;
}

impl Observable for f64 {
    fn real_part(self) -> f64 {
        self
    }
}

impl Observable for f32 {
    fn real_part(self) -> f64 {
        f64::from(self)
    }
}

impl Observable for Complex<f64> {
    fn real_part(self) -> f64 {
        self.re
    }
}

impl Observable for Complex<f32> {
    fn real_part(self) -> f64 {
        f64::from(self.re)
    }
}

/// Reduce samples to their real parts.
///
/// Imaginary parts are discarded, not folded into a modulus.
pub fn real_parts<T: Observable>(samples: &[T]) -> Vec<f64> {
    samples.iter().map(|s| s.real_part()).collect()
}

/// Result of [`binning_statistics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinningStats {
    /// Mean of the real parts.
    pub mean: f64,
    /// Error bar from the spread of bin means: `sqrt(var_binned / num_bins)`.
    pub stderr: f64,
    /// `0.5 * bin_size * |var_binned / var|`; NaN for a constant series.
    pub autocorrelation_time: f64,
    /// Population variance of the samples.
    pub variance: f64,
    /// Population variance of the bin means.
    pub binned_variance: f64,
    pub bin_size: usize,
    pub num_bins: usize,
}

impl BinningStats {
    /// True when the series has zero variance, so the autocorrelation time is undefined.
    pub fn is_degenerate(&self) -> bool {
        self.variance == 0.0
    }
}

impl fmt::Display for BinningStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Binning Statistics: Energy = {:.4} +- {:.4}, Auto correlation Time = {:.4}",
            self.mean, self.stderr, self.autocorrelation_time
        )
    }
}

/// Mean taken relative to the first value, so identical values give that value exactly.
fn average(values: &[f64]) -> f64 {
    let Some(&pivot) = values.first() else {
        return f64::NAN;
    };
    pivot + values.iter().map(|v| v - pivot).sum::<f64>() / values.len() as f64
}

fn population_variance(values: &[f64]) -> f64 {
    let m = average(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Mean, binned error bar and autocorrelation time of a sample series.
///
/// The series is split into `num_bins` contiguous bins of equal size.
/// Variances use divisor N. A constant series is not an error: the
/// autocorrelation time comes out as NaN (0/0) and `stderr` as 0; check
/// [`BinningStats::is_degenerate`].
///
/// Logs the summary line at info level.
///
/// # Errors
///
/// - [`Error::InvalidBinCount`] if `num_bins` is 0 or does not divide the sample count
/// - [`Error::EmptySeries`] if there are no samples
///
/// # Example
///
/// ```
/// use nnprobe::stats::binning_statistics;
///
/// let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
/// let stats = binning_statistics(&samples, 4).unwrap();
/// assert_eq!(stats.mean, 4.5);
/// assert!((stats.stderr - 1.0607).abs() < 1e-4);
/// ```
pub fn binning_statistics<T: Observable>(samples: &[T], num_bins: usize) -> Result<BinningStats> {
    let num_samples = samples.len();
    if num_bins == 0 || num_samples % num_bins != 0 {
        return Err(Error::InvalidBinCount { num_samples, num_bins });
    }
    if num_samples == 0 {
        return Err(Error::EmptySeries);
    }

    let values = real_parts(samples);
    let bin_size = num_samples / num_bins;

    let mean = average(&values);
    let variance = population_variance(&values);

    let bin_means: Vec<f64> = values.chunks_exact(bin_size).map(average).collect();
    let binned_variance = population_variance(&bin_means);

    let autocorrelation_time = 0.5 * bin_size as f64 * (binned_variance / variance).abs();
    let stderr = (binned_variance / num_bins as f64).sqrt();

    let stats = BinningStats {
        mean,
        stderr,
        autocorrelation_time,
        variance,
        binned_variance,
        bin_size,
        num_bins,
    };
    info!("{stats}");
    Ok(stats)
}

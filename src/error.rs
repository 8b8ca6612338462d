//! Error types with actionable diagnostics.
//!
//! Every variant carries enough context to locate the problem (which
//! variable, which flattened index, which shape) without re-running the
//! check under a debugger.

use crate::gradcheck::LayerError;
use thiserror::Error;

/// Result type alias for nnprobe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by gradient checks, statistics and the CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// Sample count is not a multiple of the requested bin count.
    #[error("Invalid bin count: {num_samples} samples cannot be split into {num_bins} equal bins\n  → Choose a bin count that divides the sample count")]
    InvalidBinCount { num_samples: usize, num_bins: usize },

    /// Binning was requested on an empty series.
    #[error("Empty sample series\n  → Binning statistics need at least one sample per bin")]
    EmptySeries,

    /// Analytic and numerical gradients disagree beyond the tolerance.
    #[error("Gradient mismatch in {variable} at flattened index {index}: numeric={numeric:.6e}, analytic={analytic:.6e}, |diff|={diff:.3e} >= {precision:e}\n  → Check the backward pass for {variable}")]
    GradientMismatch {
        variable: String,
        index: usize,
        numeric: f64,
        analytic: f64,
        diff: f64,
        precision: f64,
    },

    /// The layer under test failed inside forward or backward.
    #[error("Layer evaluation failed during {context}: {source}")]
    LayerEvaluation {
        context: String,
        #[source]
        source: LayerError,
    },

    /// Perturbation width is not a positive finite number.
    #[error("Invalid perturbation delta: {0} (must be finite and > 0)")]
    InvalidDelta(f64),

    /// Comparison tolerance is not a positive finite number.
    #[error("Invalid precision: {0} (must be finite and > 0)")]
    InvalidPrecision(f64),

    /// Gaussian scale is negative or not finite.
    #[error("Invalid normal scale: {0} (must be finite and >= 0)")]
    InvalidScale(f64),

    /// Parameter index outside the layer's parameter list.
    #[error("Unknown parameter index {index}: layer has {available} parameter arrays")]
    UnknownParameter { index: usize, available: usize },

    /// Layer did not populate a parameter gradient during backward.
    #[error("Missing gradient for {variable}\n  → backward() must store a gradient for every parameter")]
    MissingParameterGradient { variable: String },

    /// Array shapes do not line up.
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Convolution kernel longer than the periodically expanded axis.
    #[error("Kernel size {kernel} on spatial axis {axis} exceeds expanded length {expanded}")]
    KernelTooLarge {
        axis: usize,
        kernel: usize,
        expanded: usize,
    },

    /// Spatial axis or kernel of length zero.
    #[error("Empty spatial axis {axis}: input length {input}, kernel length {kernel}\n  → both must be at least 1")]
    EmptyAxis {
        axis: usize,
        input: usize,
        kernel: usize,
    },

    /// Configuration value is invalid.
    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValue { field: String, message: String },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Sample file has a line that is not a number.
    #[error("Invalid sample on line {line}: {message}")]
    SampleParse { line: usize, message: String },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Wrap a layer failure with the stage it happened in.
    pub fn layer(context: impl Into<String>, source: LayerError) -> Self {
        Self::LayerEvaluation { context: context.into(), source }
    }

    /// Check if this error stems from caller input rather than a numerical finding.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidBinCount { .. }
                | Self::EmptySeries
                | Self::InvalidDelta(_)
                | Self::InvalidPrecision(_)
                | Self::InvalidScale(_)
                | Self::UnknownParameter { .. }
                | Self::ConfigValue { .. }
                | Self::ConfigParse(_)
                | Self::SampleParse { .. }
        )
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidBinCount { .. } => "E001",
            Self::EmptySeries => "E002",
            Self::GradientMismatch { .. } => "E010",
            Self::LayerEvaluation { .. } => "E011",
            Self::MissingParameterGradient { .. } => "E012",
            Self::InvalidDelta(_) => "E020",
            Self::InvalidPrecision(_) => "E021",
            Self::InvalidScale(_) => "E022",
            Self::UnknownParameter { .. } => "E023",
            Self::ShapeMismatch { .. } => "E030",
            Self::KernelTooLarge { .. } => "E031",
            Self::EmptyAxis { .. } => "E032",
            Self::ConfigValue { .. } => "E040",
            Self::ConfigParse(_) => "E041",
            Self::SampleParse { .. } => "E042",
            Self::Io { .. } => "E050",
        }
    }
}

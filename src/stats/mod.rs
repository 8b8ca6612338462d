//! Statistics for correlated sample series.

mod binning;

pub use binning::{binning_statistics, real_parts, BinningStats, Observable};

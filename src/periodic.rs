//! Convolution with periodic boundary conditions
//!
//! Each spatial axis of length `s` is tiled twice and its last element
//! dropped, giving `2s - 1` positions where position `p` reads `x[p mod s]`.
//! A VALID cross-correlation over that expanded input yields `2s - k`
//! outputs per axis for a kernel of length `k`, which is `s` when the
//! kernel spans the whole lattice.

use crate::error::{Error, Result};
use ndarray::{ArrayD, Dimension, IxDyn};
use serde::{Deserialize, Serialize};

/// Position of the channel axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// `[batch, spatial.., channels]`
    #[default]
    ChannelsLast,
    /// `[batch, channels, spatial..]`
    ChannelsFirst,
}

impl DataFormat {
    fn channel_axis(self, rank: usize) -> usize {
        match self {
            Self::ChannelsLast => rank - 1,
            Self::ChannelsFirst => 1,
        }
    }

    fn spatial_axes(self, rank: usize) -> std::ops::Range<usize> {
        match self {
            Self::ChannelsLast => 1..rank - 1,
            Self::ChannelsFirst => 2..rank,
        }
    }

    fn index(self, batch: usize, channel: usize, spatial: &[usize]) -> Vec<usize> {
        let mut ix = Vec::with_capacity(spatial.len() + 2);
        ix.push(batch);
        match self {
            Self::ChannelsLast => {
                ix.extend_from_slice(spatial);
                ix.push(channel);
            }
            Self::ChannelsFirst => {
                ix.push(channel);
                ix.extend_from_slice(spatial);
            }
        }
        ix
    }
}

/// Periodic-boundary cross-correlation.
///
/// `filter` has shape `[k.., in_channels, out_channels]` regardless of
/// `format`. The output keeps the input's layout with `out_channels`
/// channels and `2s - k` positions per spatial axis.
///
/// # Errors
///
/// - [`Error::ShapeMismatch`] for rank or channel disagreements
/// - [`Error::EmptyAxis`] if a spatial axis or kernel has length zero
/// - [`Error::KernelTooLarge`] if a kernel is longer than `2s - 1`
pub fn periodic_convolution(
    input: &ArrayD<f64>,
    filter: &ArrayD<f64>,
    format: DataFormat,
) -> Result<ArrayD<f64>> {
    let rank = input.ndim();
    if rank < 3 {
        return Err(Error::ShapeMismatch {
            what: "input (needs batch, channel and at least one spatial axis)".to_string(),
            expected: vec![1, 1, 1],
            actual: input.shape().to_vec(),
        });
    }
    let num_spatial = rank - 2;
    if filter.ndim() != num_spatial + 2 {
        return Err(Error::ShapeMismatch {
            what: format!("filter rank for {num_spatial} spatial axes"),
            expected: vec![num_spatial + 2],
            actual: vec![filter.ndim()],
        });
    }

    let batch = input.shape()[0];
    let in_channels = input.shape()[format.channel_axis(rank)];
    let sizes: Vec<usize> = format.spatial_axes(rank).map(|a| input.shape()[a]).collect();
    let kernel: Vec<usize> = filter.shape()[..num_spatial].to_vec();
    let (filter_in, out_channels) = (filter.shape()[num_spatial], filter.shape()[num_spatial + 1]);

    if filter_in != in_channels {
        return Err(Error::ShapeMismatch {
            what: "filter input channels".to_string(),
            expected: vec![in_channels],
            actual: vec![filter_in],
        });
    }

    let mut out_sizes = Vec::with_capacity(num_spatial);
    for (axis, (&s, &k)) in sizes.iter().zip(&kernel).enumerate() {
        if s == 0 || k == 0 {
            return Err(Error::EmptyAxis { axis, input: s, kernel: k });
        }
        let expanded = 2 * s - 1;
        if k > expanded {
            return Err(Error::KernelTooLarge { axis, kernel: k, expanded });
        }
        out_sizes.push(expanded - k + 1);
    }

    let out_shape = format.index(batch, out_channels, &out_sizes);
    let mut output = ArrayD::zeros(IxDyn(&out_shape));

    let offsets: Vec<Vec<usize>> =
        ndarray::indices(IxDyn(&kernel)).into_iter().map(|ix| ix.slice().to_vec()).collect();
    let mut source = vec![0; num_spatial];

    for n in 0..batch {
        for position in ndarray::indices(IxDyn(&out_sizes)) {
            let position = position.slice();
            for co in 0..out_channels {
                let mut acc = 0.0;
                for offset in &offsets {
                    for (j, src) in source.iter_mut().enumerate() {
                        *src = (position[j] + offset[j]) % sizes[j];
                    }
                    for ci in 0..in_channels {
                        let mut fix = offset.clone();
                        fix.push(ci);
                        fix.push(co);
                        acc += input[format.index(n, ci, &source).as_slice()] * filter[fix.as_slice()];
                    }
                }
                output[format.index(n, co, position).as_slice()] = acc;
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(shape: &[usize], data: Vec<f64>) -> ArrayD<f64> {
        ArrayD::from_shape_vec(IxDyn(shape), data).unwrap()
    }

    #[test]
    fn test_1d_wraps_around() {
        let x = arr(&[1, 4, 1], vec![1.0, 2.0, 3.0, 4.0]);
        let w = arr(&[2, 1, 1], vec![1.0, 1.0]);

        let y = periodic_convolution(&x, &w, DataFormat::ChannelsLast).unwrap();

        // expanded: 1 2 3 4 1 2 3
        assert_eq!(y.shape(), &[1, 6, 1]);
        assert_eq!(y.iter().copied().collect::<Vec<_>>(), vec![3.0, 5.0, 7.0, 5.0, 3.0, 5.0]);
    }

    #[test]
    fn test_full_width_kernel_keeps_size() {
        let x = arr(&[1, 4, 1], vec![1.0, 2.0, 3.0, 4.0]);
        let w = arr(&[4, 1, 1], vec![1.0; 4]);

        let y = periodic_convolution(&x, &w, DataFormat::ChannelsLast).unwrap();

        assert_eq!(y.shape(), &[1, 4, 1]);
        assert!(y.iter().all(|&v| v == 10.0));
    }

    #[test]
    fn test_2d_cyclic_shift() {
        let x = arr(&[1, 2, 2, 1], vec![1.0, 2.0, 3.0, 4.0]);
        let w = arr(&[2, 2, 1, 1], vec![0.0, 0.0, 0.0, 1.0]);

        let y = periodic_convolution(&x, &w, DataFormat::ChannelsLast).unwrap();

        assert_eq!(y.shape(), &[1, 2, 2, 1]);
        assert_eq!(y.iter().copied().collect::<Vec<_>>(), vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_channel_mixing() {
        // two input channels weighted +1 and -1 into one output channel
        let x = arr(&[1, 3, 2], vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
        let w = arr(&[3, 2, 1], vec![1.0, -1.0, 0.0, 0.0, 0.0, 0.0]);

        let y = periodic_convolution(&x, &w, DataFormat::ChannelsLast).unwrap();

        assert_eq!(y.shape(), &[1, 3, 1]);
        assert_eq!(y.iter().copied().collect::<Vec<_>>(), vec![-9.0, -18.0, -27.0]);
    }

    #[test]
    fn test_channels_first_matches_channels_last() {
        let last = arr(&[2, 3, 2], vec![1.0, -1.0, 2.0, 0.5, 3.0, 4.0, 0.0, 1.0, 5.0, 2.0, -3.0, 1.0]);
        let first = last.clone().permuted_axes(IxDyn(&[0, 2, 1])).as_standard_layout().to_owned();
        let w = arr(&[2, 2, 3], (0..12).map(|i| f64::from(i) - 5.0).collect());

        let y_last = periodic_convolution(&last, &w, DataFormat::ChannelsLast).unwrap();
        let y_first = periodic_convolution(&first, &w, DataFormat::ChannelsFirst).unwrap();

        assert_eq!(y_first.shape(), &[2, 3, 4]);
        assert_eq!(y_first.permuted_axes(IxDyn(&[0, 2, 1])), y_last);
    }

    #[test]
    fn test_kernel_too_large() {
        let x = arr(&[1, 2, 1], vec![1.0, 2.0]);
        let w = arr(&[4, 1, 1], vec![1.0; 4]);
        let err = periodic_convolution(&x, &w, DataFormat::ChannelsLast).unwrap_err();
        assert!(matches!(err, Error::KernelTooLarge { axis: 0, kernel: 4, expanded: 3 }));
    }

    #[test]
    fn test_empty_axis() {
        let x = arr(&[1, 0, 1], vec![]);
        let w = arr(&[1, 1, 1], vec![1.0]);
        let err = periodic_convolution(&x, &w, DataFormat::ChannelsLast).unwrap_err();
        assert!(matches!(err, Error::EmptyAxis { axis: 0, input: 0, kernel: 1 }));

        let x = arr(&[1, 3, 1], vec![1.0; 3]);
        let w = arr(&[0, 1, 1], vec![]);
        let err = periodic_convolution(&x, &w, DataFormat::ChannelsLast).unwrap_err();
        assert!(matches!(err, Error::EmptyAxis { axis: 0, input: 3, kernel: 0 }));
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_channel_mismatch() {
        let x = arr(&[1, 2, 3], vec![0.0; 6]);
        let w = arr(&[1, 2, 1], vec![0.0; 2]);
        assert!(matches!(
            periodic_convolution(&x, &w, DataFormat::ChannelsLast),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rank_too_small() {
        let x = arr(&[2, 2], vec![0.0; 4]);
        let w = arr(&[1, 1], vec![1.0]);
        assert!(matches!(
            periodic_convolution(&x, &w, DataFormat::ChannelsLast),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}

//! Buffer-size bookkeeping for the buffered read and write functions.
//!
//! DAQmx read/write functions take a flat buffer plus a [`FillMode`]: with
//! `group_by_scan_number` samples are interleaved (one row per sample, one column per channel),
//! with `group_by_channel` every channel's samples are contiguous (one row per channel).
//! Buffers handed to the driver are always C-contiguous `ndarray`s in that shape.

use ndarray::{Array, Array2, ArrayViewD, Axis, Dimension, Slice};

use crate::error::{DaqmxError, Result};
use crate::options::FillMode;

/// Axis along which samples are laid out, for 2-D buffers and for the leading two axes of
/// digital line buffers.
pub fn sample_axis(fill_mode: FillMode) -> Axis {
    match fill_mode {
        FillMode::GroupByScanNumber => Axis(0),
        FillMode::GroupByChannel => Axis(1),
    }
}

fn channel_axis(fill_mode: FillMode) -> Axis {
    match fill_mode {
        FillMode::GroupByScanNumber => Axis(1),
        FillMode::GroupByChannel => Axis(0),
    }
}

/// Shape of a read buffer holding `samples` samples for each of `channels` channels.
pub fn read_shape(samples: usize, channels: usize, fill_mode: FillMode) -> (usize, usize) {
    match fill_mode {
        FillMode::GroupByScanNumber => (samples, channels),
        FillMode::GroupByChannel => (channels, samples),
    }
}

/// Drops the part of a read buffer the driver did not fill.
pub fn truncate_read<A, D: Dimension>(
    mut data: Array<A, D>,
    samples_read: usize,
    fill_mode: FillMode,
) -> Array<A, D> {
    let axis = sample_axis(fill_mode);
    if samples_read < data.len_of(axis) {
        data.slice_axis_inplace(axis, Slice::from(..samples_read));
    }
    data
}

fn shape_err(shape: &[usize], channels: usize, layout: FillMode) -> DaqmxError {
    DaqmxError::Shape {
        shape: shape.to_vec(),
        channels,
        layout: layout.to_string(),
    }
}

/// Samples per channel of write data with the given `shape`, checked against the number of
/// channels in the task.
///
/// - 1-D data with one channel: every element is a sample.
/// - 1-D data with several channels: the flat data is split evenly between channels.
/// - 2-D data: the channel axis of `layout` must match `channels`.
pub fn write_samples_per_channel(
    shape: &[usize],
    channels: usize,
    layout: FillMode,
) -> Result<usize> {
    match *shape {
        [len] if channels == 1 => Ok(len),
        [len] if channels > 1 && len % channels == 0 => Ok(len / channels),
        [rows, cols] => {
            let dims = [rows, cols];
            if dims[channel_axis(layout).index()] != channels {
                return Err(shape_err(shape, channels, layout));
            }
            Ok(dims[sample_axis(layout).index()])
        }
        _ => Err(shape_err(shape, channels, layout)),
    }
}

/// Copies write data into a C-contiguous 2-D buffer in `layout` order.
///
/// Returns the buffer and the number of samples per channel it holds.
pub fn write_buffer<A: Clone>(
    data: ArrayViewD<A>,
    channels: usize,
    layout: FillMode,
) -> Result<(Array2<A>, usize)> {
    let samples = write_samples_per_channel(data.shape(), channels, layout)?;
    let shape = read_shape(samples, channels, layout);
    let buffer = Array2::from_shape_vec(shape, data.iter().cloned().collect())
        .map_err(|_| shape_err(data.shape(), channels, layout))?;
    Ok((buffer, samples))
}

/// A single sample of `value` on every channel.
pub fn scalar_buffer<A: Clone>(value: A, channels: usize, layout: FillMode) -> Array2<A> {
    Array2::from_elem(read_shape(1, channels, layout), value)
}

/// Bytes per sample of a digital line read, given the number of lines of every channel.
///
/// The driver returns one byte per line of a channel, so the widest channel decides. A channel
/// per line is a single byte.
pub fn digital_bytes_per_sample(line_counts: &[u32]) -> usize {
    line_counts.iter().copied().max().unwrap_or(1).max(1) as usize
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{arr1, arr2, Array3, IxDyn};

    #[test]
    fn read_shapes() {
        assert_eq!(read_shape(100, 3, FillMode::GroupByScanNumber), (100, 3));
        assert_eq!(read_shape(100, 3, FillMode::GroupByChannel), (3, 100));
    }

    #[test]
    fn truncates_along_sample_axis() {
        let data = Array2::<f64>::zeros((10, 2));
        let data = truncate_read(data, 4, FillMode::GroupByScanNumber);
        assert_eq!(data.shape(), &[4, 2]);

        let data = Array2::<f64>::zeros((2, 10));
        let data = truncate_read(data, 7, FillMode::GroupByChannel);
        assert_eq!(data.shape(), &[2, 7]);

        // Digital line buffers carry a trailing byte axis
        let data = Array3::<u8>::zeros((2, 10, 8));
        let data = truncate_read(data, 3, FillMode::GroupByChannel);
        assert_eq!(data.shape(), &[2, 3, 8]);
    }

    #[test]
    fn full_reads_are_kept() {
        let data = Array2::<f64>::zeros((10, 2));
        assert_eq!(truncate_read(data, 10, FillMode::GroupByScanNumber).shape(), &[10, 2]);
    }

    #[test]
    fn one_dimensional_writes() {
        assert_eq!(write_samples_per_channel(&[50], 1, FillMode::GroupByScanNumber).unwrap(), 50);
        assert_eq!(write_samples_per_channel(&[50], 2, FillMode::GroupByChannel).unwrap(), 25);
        assert!(write_samples_per_channel(&[51], 2, FillMode::GroupByChannel).is_err());
        assert!(write_samples_per_channel(&[0], 0, FillMode::GroupByChannel).is_err());
    }

    #[test]
    fn two_dimensional_writes() {
        assert_eq!(
            write_samples_per_channel(&[1000, 4], 4, FillMode::GroupByScanNumber).unwrap(),
            1000
        );
        assert_eq!(
            write_samples_per_channel(&[4, 1000], 4, FillMode::GroupByChannel).unwrap(),
            1000
        );
        let err = write_samples_per_channel(&[4, 1000], 4, FillMode::GroupByScanNumber).unwrap_err();
        assert_eq!(
            err.to_string(),
            "data of shape [4, 1000] does not fit 4 channel(s) with layout group_by_scan_number"
        );
        assert!(write_samples_per_channel(&[2, 2, 2], 2, FillMode::GroupByChannel).is_err());
    }

    #[test]
    fn flat_data_is_split_between_channels() {
        let data = arr1(&[1., 2., 3., 4., 5., 6.]).into_dyn();
        let (buf, samples) = write_buffer(data.view(), 2, FillMode::GroupByChannel).unwrap();
        assert_eq!(samples, 3);
        assert_eq!(buf, arr2(&[[1., 2., 3.], [4., 5., 6.]]));

        let (buf, samples) = write_buffer(data.view(), 2, FillMode::GroupByScanNumber).unwrap();
        assert_eq!(samples, 3);
        assert_eq!(buf, arr2(&[[1., 2.], [3., 4.], [5., 6.]]));
    }

    #[test]
    fn transposed_views_are_made_contiguous() {
        let data = arr2(&[[1u8, 0, 1], [0, 1, 0]]);
        let view = data.t().into_dyn();
        let (buf, samples) = write_buffer(view, 2, FillMode::GroupByScanNumber).unwrap();
        assert_eq!(samples, 3);
        assert!(buf.is_standard_layout());
        assert_eq!(buf, arr2(&[[1, 0], [0, 1], [1, 0]]));
    }

    #[test]
    fn scalar_writes() {
        assert_eq!(scalar_buffer(1u8, 3, FillMode::GroupByChannel).shape(), &[3, 1]);
        assert_eq!(scalar_buffer(1u8, 3, FillMode::GroupByScanNumber).shape(), &[1, 3]);
        let zero_dim = ndarray::ArrayD::<f64>::zeros(IxDyn(&[]));
        assert!(write_buffer(zero_dim.view(), 1, FillMode::GroupByChannel).is_err());
    }

    #[test]
    fn digital_bytes() {
        // One channel per line
        assert_eq!(digital_bytes_per_sample(&[1, 1, 1, 1]), 1);
        assert_eq!(digital_bytes_per_sample(&[8, 32, 4]), 32);
        // Port channel created after line channels
        assert_eq!(digital_bytes_per_sample(&[1, 1, 8]), 8);
        assert_eq!(digital_bytes_per_sample(&[8, 1]), 8);
        assert_eq!(digital_bytes_per_sample(&[]), 1);
        assert_eq!(digital_bytes_per_sample(&[0]), 1);
    }
}

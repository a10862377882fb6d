//! # General disparity objects
//!
//! This module provides the disparity range convention shared by the cost volume builders and
//! the regressor, and the floating point disparity map they produce.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, ImageBuffer, Luma};
use log::warn;
use ndarray::{Array3, Array4, ArrayView2, Axis};

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Single channel 16 bit raster used when saving disparity maps.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Indexing convention of the disparity axis of a cost volume.
///
/// The convention is fixed when the cost volume is built and must be carried through to the
/// regressor, otherwise the expected disparity is computed against the wrong candidate values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisparityRange {
    /// Candidates `0..max_disp`, index `d` has value `d`.
    NonNegative { max_disp: usize },

    /// Candidates `-max_disp..max_disp`, index `d` has value `d - max_disp`.
    Signed { max_disp: usize }
}

/// A batch of floating point disparity maps, axes `[batch, height, width]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DisparityMap {
    data: Array3<f32>,
    range: DisparityRange
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityRange {
    /// Number of entries along the disparity axis.
    pub fn len(&self) -> usize {
        match *self {
            DisparityRange::NonNegative { max_disp } => max_disp,
            DisparityRange::Signed { max_disp } => 2 * max_disp
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Real disparity value of the given index along the disparity axis.
    pub fn value_of(&self, index: usize) -> f32 {
        match *self {
            DisparityRange::NonNegative { .. } => index as f32,
            DisparityRange::Signed { max_disp } => index as f32 - max_disp as f32
        }
    }

    /// Signed pixel offset used to build the slice at the given index.
    pub fn offset_of(&self, index: usize) -> isize {
        match *self {
            DisparityRange::NonNegative { .. } => index as isize,
            DisparityRange::Signed { max_disp } => index as isize - max_disp as isize
        }
    }

    /// All candidate values in axis order.
    pub fn values(&self) -> Vec<f32> {
        (0..self.len()).map(|i| self.value_of(i)).collect()
    }

    pub fn min_value(&self) -> f32 {
        self.value_of(0)
    }

    pub fn max_value(&self) -> f32 {
        self.value_of(self.len().saturating_sub(1))
    }

    /// Arithmetic mean of the candidate values, the result of regressing a flat cost.
    pub fn mean_value(&self) -> f32 {
        (self.min_value() + self.max_value()) / 2.0
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self.is_empty() {
            true => Err(Error::InvalidMaxDisparity),
            false => Ok(())
        }
    }

    /// Check that every candidate value fits a 16 bit raster written at `scale`.
    pub fn check_raster_scale(&self, scale: f32) -> Result<()> {
        let span = self.max_value() - self.min_value();

        if !(scale > 0.0) || span * scale > u16::MAX as f32 {
            return Err(Error::RasterScale { scale, span });
        }

        Ok(())
    }
}

impl DisparityMap {
    pub fn new(data: Array3<f32>, range: DisparityRange) -> Self {
        DisparityMap { data, range }
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn range(&self) -> DisparityRange {
        self.range
    }

    /// `(batch, height, width)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, batch: usize, y: usize, x: usize) -> Option<f32> {
        self.data.get((batch, y, x)).copied()
    }

    /// View with a trailing singleton channel axis, `[batch, height, width, 1]`.
    pub fn with_channel_axis(&self) -> Array4<f32> {
        self.data.clone().insert_axis(Axis(3))
    }

    /// Minimum and maximum observed disparity over the whole batch.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v)))
        })
    }

    /// Converts one map of the batch into a Luma8 image, clamping values to `[0, 255]`.
    pub fn to_luma(&self, batch: usize) -> Result<GrayImage> {
        self.to_luma_with(batch, |v| v)
    }

    /// Converts one map of the batch to a normalised GrayImage.
    ///
    /// The full candidate span of the disparity range is stretched over `[0, 255]`, so signed
    /// maps keep their zero disparity at mid grey.
    pub fn to_luma_normalised(&self, batch: usize) -> Result<GrayImage> {
        let lo = self.range.min_value();
        let span = self.range.max_value() - lo;

        let mult = match span > 0.0 {
            true => 255.0 / span,
            false => 1.0
        };

        self.to_luma_with(batch, |v| (v - lo) * mult)
    }

    /// Converts one map of the batch into a 16 bit fixed point raster.
    ///
    /// The stored value is `(disparity - min_value) * scale`, rounded. The whole candidate span
    /// must fit in `u16` at `scale`; values outside the candidate span are clamped.
    pub fn to_luma16(&self, batch: usize, scale: f32) -> Result<Gray16Image> {
        self.range.check_raster_scale(scale)?;

        let map = self.batch(batch)?;
        let lo = self.range.min_value();
        let (height, width) = map.dim();

        let mut new = Gray16Image::new(width as u32, height as u32);
        let mut clamped = 0usize;

        for ((y, x), &v) in map.indexed_iter() {
            let raw = ((v - lo) * scale).round();
            let val = raw.max(0.0).min(u16::MAX as f32);

            if val != raw {
                clamped += 1;
            }

            *new.get_pixel_mut(x as u32, y as u32) = Luma([val as u16]);
        }

        if clamped > 0 {
            warn!("Clamped {} disparities outside {:?} to the raster limits", clamped, self.range);
        }

        Ok(new)
    }

    /// Inverse of [`DisparityMap::to_luma16`], returning a batch of one.
    pub fn from_luma16(raster: &Gray16Image, range: DisparityRange, scale: f32) -> Self {
        let lo = range.min_value();
        let (width, height) = raster.dimensions();

        let data = Array3::from_shape_fn((1, height as usize, width as usize), |(_, y, x)| {
            raster.get_pixel(x as u32, y as u32)[0] as f32 / scale + lo
        });

        DisparityMap { data, range }
    }

    fn batch(&self, batch: usize) -> Result<ArrayView2<f32>> {
        let len = self.data.len_of(Axis(0));

        if batch >= len {
            return Err(Error::BatchOutOfRange { index: batch, len });
        }

        Ok(self.data.index_axis(Axis(0), batch))
    }

    fn to_luma_with<F: Fn(f32) -> f32>(&self, batch: usize, f: F) -> Result<GrayImage> {
        let map = self.batch(batch)?;
        let (height, width) = map.dim();

        let mut new = GrayImage::new(width as u32, height as u32);

        for ((y, x), &v) in map.indexed_iter() {
            let mut val = f(v);

            if val < 0.0 {
                val = 0.0;
            }
            else if val > 255.0 {
                val = 255.0;
            }

            *new.get_pixel_mut(x as u32, y as u32) = Luma([val as u8]);
        }

        Ok(new)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn range_values() {
        let pos = DisparityRange::NonNegative { max_disp: 4 };
        assert_eq!(pos.len(), 4);
        assert_eq!(pos.values(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_relative_eq!(pos.mean_value(), 1.5);

        let signed = DisparityRange::Signed { max_disp: 2 };
        assert_eq!(signed.len(), 4);
        assert_eq!(signed.values(), vec![-2.0, -1.0, 0.0, 1.0]);
        assert_eq!(signed.offset_of(0), -2);
        assert_relative_eq!(signed.mean_value(), -0.5);

        assert!(DisparityRange::Signed { max_disp: 0 }.validate().is_err());
    }

    #[test]
    fn luma_clamps_and_normalises() {
        let data = Array3::from_shape_vec((1, 1, 3), vec![-3.0, 1.0, 2.0]).unwrap();
        let map = DisparityMap::new(data, DisparityRange::Signed { max_disp: 2 });

        let luma = map.to_luma(0).unwrap();
        assert_eq!(luma.get_pixel(0, 0)[0], 0);
        assert_eq!(luma.get_pixel(1, 0)[0], 1);

        // Span is [-2, 1], so 1 maps to the top of the scale.
        let norm = map.to_luma_normalised(0).unwrap();
        assert_eq!(norm.get_pixel(1, 0)[0], 255);
        assert_eq!(norm.get_pixel(2, 0)[0], 255);

        assert!(map.to_luma(1).is_err());
    }

    #[test]
    fn luma16_round_trip() {
        let range = DisparityRange::Signed { max_disp: 8 };
        let data = Array3::from_shape_vec((1, 2, 2), vec![-7.25, 0.0, 3.5, 7.0]).unwrap();
        let map = DisparityMap::new(data, range);

        let raster = map.to_luma16(0, 256.0).unwrap();
        let back = DisparityMap::from_luma16(&raster, range, 256.0);

        for (a, b) in map.data().iter().zip(back.data().iter()) {
            assert_relative_eq!(a, b, epsilon = 1.0 / 256.0);
        }
    }

    #[test]
    fn raster_scale_must_cover_candidates() {
        let wide = DisparityRange::Signed { max_disp: 200 };

        assert!(matches!(wide.check_raster_scale(256.0), Err(Error::RasterScale { .. })));
        assert!(wide.check_raster_scale(128.0).is_ok());
        assert!(matches!(
            DisparityRange::NonNegative { max_disp: 4 }.check_raster_scale(0.0),
            Err(Error::RasterScale { .. })
        ));

        let data = Array3::from_shape_vec((1, 1, 2), vec![150.0, -150.0]).unwrap();
        let map = DisparityMap::new(data, wide);

        assert!(map.to_luma16(0, 256.0).is_err());

        let raster = map.to_luma16(0, 128.0).unwrap();
        assert_eq!(DisparityMap::from_luma16(&raster, wide, 128.0), map);
    }

    #[test]
    fn channel_axis_and_extent() {
        let data = Array3::from_shape_vec((1, 1, 2), vec![0.5, 1.5]).unwrap();
        let map = DisparityMap::new(data, DisparityRange::NonNegative { max_disp: 2 });

        assert_eq!(map.with_channel_axis().shape(), &[1, 1, 2, 1]);
        assert_eq!(map.min_max(), Some((0.5, 1.5)));
        assert_eq!(map.get(0, 0, 1), Some(1.5));
        assert_eq!(map.get(0, 1, 0), None);
    }
}

//! # Cost volume construction
//!
//! Correlates a pair of feature maps across a range of candidate disparities, producing a cost
//! volume with axes `[batch, disparity, height, width, channels]`.
//!
//! Two conventions are provided:
//!
//! - [`Concatenation`] (PSMNet): disparities `0..max_disp`, each slice concatenates the left
//!   features with the right features shifted by `d` along the width axis.
//! - [`Difference`] (StereoNet): disparities `-max_disp..max_disp`, each slice is the left
//!   features minus the shifted right features. Remote sensing pairs can be offset in either
//!   direction, hence the signed range.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::debug;
use ndarray::{s, Array4, Array5, ArrayView4, Axis};

use crate::disparity::DisparityRange;
use crate::error::*;
use crate::shift::shift_zero_fill;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Width axis of a feature map `[batch, height, width, channels]`.
const WIDTH_AXIS: usize = 2;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Feature map with axes `[batch, height, width, channels]`.
pub type FeatureMap = Array4<f32>;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Concatenation based cost volume over disparities `0..max_disp`.
#[derive(Debug, Clone, Copy)]
pub struct Concatenation {
    pub max_disp: usize
}

/// Difference based cost volume over disparities `-max_disp..max_disp`.
#[derive(Debug, Clone, Copy)]
pub struct Difference {
    pub max_disp: usize
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait CostVolume {
    /// Disparity convention of the volumes this builder produces.
    fn range(&self) -> DisparityRange;

    /// Build the cost volume of a `[left, right]` feature pair.
    fn build(&self, inputs: &[FeatureMap]) -> Result<Array5<f32>> {
        match inputs {
            [left, right] => self.build_pair(left.view(), right.view()),
            _ => Err(Error::ArityError(inputs.len()))
        }
    }

    fn build_pair(&self, left: ArrayView4<f32>, right: ArrayView4<f32>) -> Result<Array5<f32>>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CostVolume for Concatenation {
    fn range(&self) -> DisparityRange {
        DisparityRange::NonNegative { max_disp: self.max_disp }
    }

    fn build_pair(&self, left: ArrayView4<f32>, right: ArrayView4<f32>) -> Result<Array5<f32>> {
        concat_volume(left, right, self.max_disp)
    }
}

impl CostVolume for Difference {
    fn range(&self) -> DisparityRange {
        DisparityRange::Signed { max_disp: self.max_disp }
    }

    fn build_pair(&self, left: ArrayView4<f32>, right: ArrayView4<f32>) -> Result<Array5<f32>> {
        difference_volume(left, right, self.max_disp)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Build a concatenation cost volume of shape `[N, max_disp, H, W, 2C]`.
///
/// Slice `d` holds the left features in channels `..C` and the right features shifted right by
/// `d` columns in channels `C..`. The first `d` columns of the right half are zero.
pub fn concat_volume(
    left: ArrayView4<f32>,
    right: ArrayView4<f32>,
    max_disp: usize
) -> Result<Array5<f32>> {
    check_pair(&left, &right)?;
    let range = DisparityRange::NonNegative { max_disp };
    range.validate()?;

    let (n, h, w, c) = left.dim();
    let mut volume = Array5::<f32>::zeros((n, range.len(), h, w, 2 * c));

    for (d, mut slice) in volume.axis_iter_mut(Axis(1)).enumerate() {
        let shifted = shift_zero_fill(&right, WIDTH_AXIS, range.offset_of(d))?;

        slice.slice_mut(s![.., .., .., ..c]).assign(&left);
        slice.slice_mut(s![.., .., .., c..]).assign(&shifted);
    }

    debug!("Built concatenation cost volume {:?}", volume.shape());

    Ok(volume)
}

/// Build a difference cost volume of shape `[N, 2 * max_disp, H, W, C]`.
///
/// Slice `i` (for `i` in `-max_disp..max_disp`) holds `L[w] - R[w - i]` wherever both columns
/// exist, and exact zeros in the `|i|` columns where they do not: the first `i` columns for
/// positive `i`, the last `|i|` columns for negative `i`.
pub fn difference_volume(
    left: ArrayView4<f32>,
    right: ArrayView4<f32>,
    max_disp: usize
) -> Result<Array5<f32>> {
    check_pair(&left, &right)?;
    let range = DisparityRange::Signed { max_disp };
    range.validate()?;

    let (n, h, w, c) = left.dim();
    let mut volume = Array5::<f32>::zeros((n, range.len(), h, w, c));

    for (d, mut slice) in volume.axis_iter_mut(Axis(1)).enumerate() {
        let i = range.offset_of(d);

        // Align L[w + i] with R[w], subtract, then move the result back into place. The second
        // shift drops every column where one of the operands was out of bounds.
        let aligned = shift_zero_fill(&left, WIDTH_AXIS, -i)? - &right;
        slice.assign(&shift_zero_fill(&aligned, WIDTH_AXIS, i)?);
    }

    debug!("Built difference cost volume {:?}", volume.shape());

    Ok(volume)
}

fn check_pair(left: &ArrayView4<f32>, right: &ArrayView4<f32>) -> Result<()> {
    if left.shape() != right.shape() {
        return Err(Error::ShapeMismatch {
            left: left.shape().to_vec(),
            right: right.shape().to_vec()
        });
    }

    Ok(())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

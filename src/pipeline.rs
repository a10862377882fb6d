//! # Stereo network pipeline
//!
//! Chains feature extraction, cost volume construction, regularisation and soft-argmin
//! regression. Feature extraction and regularisation are learned in a real network, so they are
//! traits here: [`IntensityFeatures`] and [`AbsoluteSum`] provide a classical matching pipeline
//! with the same structure which needs no weights.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::debug;
use ndarray::{s, Array4, ArrayView3, ArrayView5, Axis, Zip};

use crate::config::{Params, Variant};
use crate::cost_volume::FeatureMap;
use crate::disparity::{DisparityMap, DisparityRange};
use crate::error::*;
use crate::regression::soft_argmin;

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait FeatureExtractor {
    /// Extract a batch of one feature map from an `[height, width, 3]` image.
    fn extract(&self, image: ArrayView3<f32>) -> Result<FeatureMap>;
}

pub trait CostRegularizer {
    /// Collapse a `[N, D, H, W, C]` cost volume built by `variant` into `[N, D, H, W]` costs.
    fn regularize(&self, volume: ArrayView5<f32>, variant: Variant) -> Result<Array4<f32>>;
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Uses image intensities in `[0, 1]` as features.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityFeatures {
    /// Average the colour channels into a single channel.
    pub grayscale: bool
}

/// Matching cost equal to the summed absolute difference between left and right features,
/// multiplied by `gain`. Higher gains sharpen the disparity distribution.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteSum {
    pub gain: f32
}

pub struct StereoNetwork<E, R> {
    extractor: E,
    regularizer: R,
    variant: Variant,
    max_disp: usize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl FeatureExtractor for IntensityFeatures {
    fn extract(&self, image: ArrayView3<f32>) -> Result<FeatureMap> {
        let scaled = image.mapv(|v| v / 255.0);

        let features = match self.grayscale {
            true => scaled.mean_axis(Axis(2)).ok_or(Error::EmptyRaster)?.insert_axis(Axis(2)),
            false => scaled
        };

        Ok(features.insert_axis(Axis(0)))
    }
}

impl CostRegularizer for AbsoluteSum {
    fn regularize(&self, volume: ArrayView5<f32>, variant: Variant) -> Result<Array4<f32>> {
        let (n, d, h, w, c) = volume.dim();
        let mut cost = Array4::<f32>::zeros((n, d, h, w));
        let gain = self.gain;

        match variant {
            Variant::Concatenation => {
                let half = c / 2;
                let left = volume.slice(s![.., .., .., .., ..half]);
                let right = volume.slice(s![.., .., .., .., half..]);

                Zip::from(&mut cost)
                    .and(left.lanes(Axis(4)))
                    .and(right.lanes(Axis(4)))
                    .par_for_each(|out, l, r| {
                        *out = gain * l.iter().zip(r.iter()).map(|(a, b)| (a - b).abs()).sum::<f32>();
                    });
            }
            Variant::Difference => {
                Zip::from(&mut cost)
                    .and(volume.lanes(Axis(4)))
                    .par_for_each(|out, f| *out = gain * f.iter().map(|v| v.abs()).sum::<f32>());
            }
        }

        Ok(cost)
    }
}

impl<E, R> StereoNetwork<E, R>
where
    E: FeatureExtractor,
    R: CostRegularizer
{
    pub fn new(extractor: E, regularizer: R, variant: Variant, max_disp: usize) -> Self {
        Self {
            extractor,
            regularizer,
            variant,
            max_disp
        }
    }

    pub fn range(&self) -> DisparityRange {
        self.variant.range(self.max_disp)
    }

    /// Estimate the disparity of a stereo pair of `[height, width, 3]` images.
    pub fn predict(&self, left: ArrayView3<f32>, right: ArrayView3<f32>) -> Result<DisparityMap> {
        let left = self.extractor.extract(left)?;
        let right = self.extractor.extract(right)?;

        let volume = self.variant.builder(self.max_disp).build(&[left, right])?;
        let cost = self.regularizer.regularize(volume.view(), self.variant)?;
        debug!("Regularised cost volume {:?}", cost.shape());

        soft_argmin(cost.view(), self.range())
    }
}

impl StereoNetwork<IntensityFeatures, AbsoluteSum> {
    /// Classical matching network configured from `params`.
    pub fn classical(params: &Params) -> Self {
        Self::new(
            IntensityFeatures { grayscale: params.grayscale },
            AbsoluteSum { gain: params.cost_gain },
            params.variant,
            params.max_disparity
        )
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

//! # Configuration
//!
//! Parameters for prediction and evaluation, loaded from a JSON file. Missing keys take their
//! default value.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use serde::Deserialize;

use crate::cost_volume::{Concatenation, CostVolume, Difference};
use crate::disparity::DisparityRange;
use crate::error::*;
use crate::metrics::D1Threshold;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Which cost volume the network is built around.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// PSMNet style, disparities `0..max_disparity`.
    Concatenation,

    /// StereoNet style, disparities `-max_disparity..max_disparity`.
    Difference
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    pub variant: Variant,
    pub max_disparity: usize,

    /// Fixed point scale of saved disparity rasters.
    pub output_scale: f32,

    /// Factor applied to both rasters before computing metrics.
    pub metric_scale: f32,
    pub d1_threshold: D1Threshold,

    /// Collapse input imagery to a single intensity channel before matching.
    pub grayscale: bool,

    /// Gain applied to the classical matching cost.
    pub cost_gain: f32
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Variant {
    pub fn range(&self, max_disp: usize) -> DisparityRange {
        match self {
            Variant::Concatenation => DisparityRange::NonNegative { max_disp },
            Variant::Difference => DisparityRange::Signed { max_disp }
        }
    }

    pub fn builder(&self, max_disp: usize) -> Box<dyn CostVolume + Send + Sync> {
        match self {
            Variant::Concatenation => Box::new(Concatenation { max_disp }),
            Variant::Difference => Box::new(Difference { max_disp })
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            variant: Variant::Concatenation,
            max_disparity: 64,
            output_scale: 256.0,
            metric_scale: 1.0,
            d1_threshold: D1Threshold::default(),
            grayscale: false,
            cost_gain: 10.0
        }
    }
}

impl Params {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(json)?;

        if params.max_disparity == 0 {
            return Err(Error::InvalidMaxDisparity);
        }

        params.range().check_raster_scale(params.output_scale)?;

        Ok(params)
    }

    pub fn range(&self) -> DisparityRange {
        self.variant.range(self.max_disparity)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

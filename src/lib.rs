//! # Stereo network disparity estimation
//!
//! This crate provides cost volume construction and soft-argmin disparity regression for stereo
//! networks (PSMNet, StereoNet) working on remote sensing imagery.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod disparity;
mod error;
pub mod config;
pub mod cost_volume;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod regression;
pub mod shift;
#[cfg(feature = "statistics")]
pub mod statistics;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use crate::error::{Error, Result};

pub mod prelude {
    pub use crate::config::{Params, Variant};
    pub use crate::cost_volume::{concat_volume, difference_volume, Concatenation, CostVolume, Difference, FeatureMap};
    pub use crate::disparity::{DisparityMap, DisparityRange, Gray16Image};
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::{AbsoluteSum, CostRegularizer, FeatureExtractor, IntensityFeatures, StereoNetwork};
    pub use crate::regression::{soft_argmin, SoftArgmin};
}

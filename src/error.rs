//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the stereonet crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Shape mismatch: left is {left:?}, right is {right:?}")]
    ShapeMismatch {
        left: Vec<usize>,
        right: Vec<usize>
    },

    #[error("Expected exactly 2 feature maps, got {0}")]
    ArityError(usize),

    #[error("Maximum disparity must be greater than zero")]
    InvalidMaxDisparity,

    #[error("Cost volume has {found} disparities but the range expects {expected}")]
    DisparityAxisMismatch {
        expected: usize,
        found: usize
    },

    #[error("Axis {axis} is out of range for an array with {ndim} dimensions")]
    AxisOutOfRange {
        axis: usize,
        ndim: usize
    },

    #[error("{left:?} contains {left_count} files but {right:?} contains {right_count}")]
    FileCountMismatch {
        left: PathBuf,
        left_count: usize,
        right: PathBuf,
        right_count: usize
    },

    #[error("Batch index {index} is out of range for a batch of {len}")]
    BatchOutOfRange {
        index: usize,
        len: usize
    },

    #[error("Raster scale {scale} cannot hold a disparity span of {span} in 16 bits")]
    RasterScale {
        scale: f32,
        span: f32
    },

    #[error("Raster contains no pixels")]
    EmptyRaster,

    #[error("Unsupported image at {0:?}")]
    UnsupportedImage(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Could not parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[cfg(feature = "statistics")]
    #[error("Plotting failed: {0}")]
    Plot(String)
}

//! # Directory prediction and evaluation
//!
//! Pairs up left/right imagery (or estimate/ground truth rasters) from two directories by sorted
//! file name, runs a network over each pair and scores the results. The two listings must have
//! the same length, otherwise pairs would be silently misaligned.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{info, warn};
use ndarray::{Array3, Axis};
use tiff::decoder::DecodingResult;

use crate::config::Params;
use crate::disparity::{DisparityMap, DisparityRange};
use crate::error::*;
use crate::metrics::{d1_error, end_point_error};
use crate::pipeline::{CostRegularizer, FeatureExtractor, StereoNetwork};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Metrics of a single evaluated tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileReport {
    pub tile: String,
    pub epe: f32,
    pub d1: f32
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Sorted files of both directories, zipped together.
pub fn paired_files<P: AsRef<Path>, Q: AsRef<Path>>(a_dir: P, b_dir: Q) -> Result<Vec<(PathBuf, PathBuf)>> {
    let a = sorted_files(a_dir.as_ref())?;
    let b = sorted_files(b_dir.as_ref())?;

    if a.len() != b.len() {
        return Err(Error::FileCountMismatch {
            left: a_dir.as_ref().to_path_buf(),
            left_count: a.len(),
            right: b_dir.as_ref().to_path_buf(),
            right_count: b.len()
        });
    }

    Ok(a.into_iter().zip(b.into_iter()).collect())
}

/// Name of the disparity raster written for a left image: `RGB` becomes `DSP` and the raster is
/// stored as a 16 bit PNG.
pub fn output_name(left_name: &str) -> String {
    let name = left_name.replace("RGB", "DSP");

    Path::new(&name)
        .with_extension("png")
        .to_string_lossy()
        .into_owned()
}

/// Tile identifier of a disparity raster, the file stem without its `_DSP` suffix.
pub fn tile_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match stem.strip_suffix("_DSP") {
        Some(tile) => tile.to_string(),
        None => stem
    }
}

/// Read an image as `[height, width, 3]` intensities in `[0, 255]`.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Array3<f32>> {
    let rgb = image::open(path)?.to_rgb();
    let (width, height) = rgb.dimensions();

    Ok(Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32
    }))
}

/// Save the first map of the batch as a 16 bit raster.
pub fn save_disparity<P: AsRef<Path>>(map: &DisparityMap, path: P, scale: f32) -> Result<()> {
    map.to_luma16(0, scale)?.save(path)?;
    Ok(())
}

/// Read a single channel disparity raster.
///
/// 16 bit PNGs are the fixed point rasters written by [`save_disparity`] and are decoded with
/// `range` and `scale`. TIFFs (8/16 bit, float) and 8 bit images hold disparities directly, as
/// dataset ground truth does.
pub fn read_disparity<P: AsRef<Path>>(path: P, range: DisparityRange, scale: f32) -> Result<DisparityMap> {
    let path = path.as_ref();

    if is_tiff(path) {
        return read_disparity_tiff(path, range);
    }

    match image::open(path)? {
        DynamicImage::ImageLuma16(raster) => Ok(DisparityMap::from_luma16(&raster, range, scale)),
        DynamicImage::ImageLuma8(raster) => {
            let (width, height) = raster.dimensions();
            let data = Array3::from_shape_fn((1, height as usize, width as usize), |(_, y, x)| {
                raster.get_pixel(x as u32, y as u32)[0] as f32
            });

            Ok(DisparityMap::new(data, range))
        }
        _ => Err(Error::UnsupportedImage(path.to_path_buf()))
    }
}

/// Predict every left/right pair and write the disparity rasters into `out_dir`.
///
/// Returns the paths of the written rasters.
pub fn predict_dir<E, R>(
    net: &StereoNetwork<E, R>,
    left_dir: &Path,
    right_dir: &Path,
    out_dir: &Path,
    params: &Params
) -> Result<Vec<PathBuf>>
where
    E: FeatureExtractor,
    R: CostRegularizer
{
    let pairs = paired_files(left_dir, right_dir)?;
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(pairs.len());

    for (left, right) in pairs {
        let disparity = net.predict(read_image(&left)?.view(), read_image(&right)?.view())?;

        let name = left
            .file_name()
            .map(|n| output_name(&n.to_string_lossy()))
            .ok_or_else(|| Error::UnsupportedImage(left.clone()))?;
        let out = out_dir.join(name);

        save_disparity(&disparity, &out, params.output_scale)?;
        info!("Predicted {:?} -> {:?}", left, out);

        written.push(out);
    }

    Ok(written)
}

/// Score every estimate against its ground truth.
pub fn evaluate_dir(est_dir: &Path, gt_dir: &Path, params: &Params) -> Result<Vec<TileReport>> {
    let range = params.range();
    let mut reports = Vec::new();

    for (est, gt) in paired_files(est_dir, gt_dir)? {
        let est_map = read_disparity(&est, range, params.output_scale)?;
        let gt_map = read_disparity(&gt, range, params.output_scale)?;

        let est_view = est_map.data().index_axis(Axis(0), 0);
        let gt_view = gt_map.data().index_axis(Axis(0), 0);

        let report = TileReport {
            tile: tile_name(&est),
            epe: end_point_error(est_view, gt_view, params.metric_scale)?,
            d1: d1_error(est_view, gt_view, params.metric_scale, params.d1_threshold)?
        };
        info!("Tile: {}, EPE: {}, D1: {}", report.tile, report.epe, report.d1);

        reports.push(report);
    }

    Ok(reports)
}

fn is_tiff(path: &Path) -> bool {
    path.extension().map_or(false, |ext| {
        ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff")
    })
}

fn read_disparity_tiff(path: &Path, range: DisparityRange) -> Result<DisparityMap> {
    let unsupported = || Error::UnsupportedImage(path.to_path_buf());
    let mut decoder = tiff::decoder::Decoder::new(std::fs::File::open(path)?)?;

    match decoder.colortype()? {
        tiff::ColorType::Gray(_) => {}
        _ => return Err(unsupported())
    }

    let (width, height) = decoder.dimensions()?;

    let values: Vec<f32> = match decoder.read_image()? {
        DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        _ => return Err(unsupported())
    };

    let data = Array3::from_shape_vec((1, height as usize, width as usize), values)
        .map_err(|_| unsupported())?;

    Ok(DisparityMap::new(data, range))
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_file() {
            files.push(path);
        }
        else {
            warn!("Skipping non-file entry {:?}", path);
        }
    }

    files.sort();
    Ok(files)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

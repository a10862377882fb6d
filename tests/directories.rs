//! Batch prediction and evaluation over directories of tiles.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use approx::assert_relative_eq;
use cv_stereonet::{io, prelude::*};
use image::{Rgb, RgbImage};
use ndarray::Array3;

// -----------------------------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------------------------

fn write_texture(path: &Path, shift: u32) {
    RgbImage::from_fn(16, 4, |x, y| {
        let v = |c: u32| (((x + shift) * 37 + c * 11 + y * 5) % 256) as u8;
        Rgb([v(0), v(1), v(2)])
    })
    .save(path)
    .unwrap();
}

fn params() -> Params {
    Params {
        variant: Variant::Difference,
        max_disparity: 4,
        cost_gain: 50.0,
        ..Params::default()
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[test]
fn predict_then_evaluate() {
    let left_dir = tempfile::tempdir().unwrap();
    let right_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let gt_dir = tempfile::tempdir().unwrap();

    for tile in &["JAX_001", "JAX_002"] {
        write_texture(&left_dir.path().join(format!("{}_LEFT_RGB.png", tile)), 0);
        write_texture(&right_dir.path().join(format!("{}_RIGHT_RGB.png", tile)), 2);
    }

    let params = params();
    let net = StereoNetwork::classical(&params);
    let written = io::predict_dir(&net, left_dir.path(), right_dir.path(), out_dir.path(), &params)
        .unwrap();

    assert_eq!(written.len(), 2);
    assert_eq!(written[0].file_name().unwrap(), "JAX_001_LEFT_DSP.png");

    // Interior columns carry the true shift of 2 pixels
    let map = io::read_disparity(&written[1], params.range(), params.output_scale).unwrap();
    for x in 3..12 {
        assert_relative_eq!(map.get(0, 1, x).unwrap(), 2.0, epsilon = 1.0 / 256.0);
    }

    // Ground truth equal to the estimate scores perfectly
    for path in &written {
        let est = io::read_disparity(path, params.range(), params.output_scale).unwrap();
        io::save_disparity(&est, gt_dir.path().join(path.file_name().unwrap()), params.output_scale)
            .unwrap();
    }

    let reports = io::evaluate_dir(out_dir.path(), gt_dir.path(), &params).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].tile, "JAX_001_LEFT");
    for report in &reports {
        assert_relative_eq!(report.epe, 0.0);
        assert_relative_eq!(report.d1, 0.0);
    }
}

#[test]
fn evaluate_known_offset() {
    let est_dir = tempfile::tempdir().unwrap();
    let gt_dir = tempfile::tempdir().unwrap();
    let params = params();
    let range = params.range();

    // Estimate is off by 3.5 in one pixel out of four and exact elsewhere
    let est = Array3::from_shape_vec((1, 2, 2), vec![1.0, 1.0, 1.0, 3.5]).unwrap();
    let gt = Array3::from_shape_vec((1, 2, 2), vec![1.0, 1.0, 1.0, 0.0]).unwrap();

    io::save_disparity(&DisparityMap::new(est, range), est_dir.path().join("A_DSP.png"), 256.0)
        .unwrap();
    io::save_disparity(&DisparityMap::new(gt, range), gt_dir.path().join("A_DSP.png"), 256.0)
        .unwrap();

    let reports = io::evaluate_dir(est_dir.path(), gt_dir.path(), &params).unwrap();
    assert_eq!(reports[0].tile, "A");
    assert_relative_eq!(reports[0].epe, 3.5 / 4.0);
    assert_relative_eq!(reports[0].d1, 0.25);
}

#[test]
fn evaluate_against_float_ground_truth() {
    let est_dir = tempfile::tempdir().unwrap();
    let gt_dir = tempfile::tempdir().unwrap();
    let params = params();
    let range = params.range();

    let est = Array3::from_shape_vec((1, 2, 2), vec![-1.0, 0.5, 2.0, 3.0]).unwrap();
    io::save_disparity(&DisparityMap::new(est, range), est_dir.path().join("B_DSP.png"), 256.0)
        .unwrap();

    // Ground truth holds disparities directly, without the fixed point offset
    let gt_path = gt_dir.path().join("B_DSP.tif");
    tiff::encoder::TiffEncoder::new(std::fs::File::create(&gt_path).unwrap())
        .unwrap()
        .write_image::<tiff::encoder::colortype::Gray32Float>(2, 2, &[-1.0, 0.5, 2.0, -3.0])
        .unwrap();

    let reports = io::evaluate_dir(est_dir.path(), gt_dir.path(), &params).unwrap();
    assert_eq!(reports[0].tile, "B");
    assert_relative_eq!(reports[0].epe, 6.0 / 4.0);
    assert_relative_eq!(reports[0].d1, 0.25);
}

#[test]
fn evaluate_against_8_bit_ground_truth() {
    let est_dir = tempfile::tempdir().unwrap();
    let gt_dir = tempfile::tempdir().unwrap();
    let params = params();

    let est = Array3::from_shape_vec((1, 2, 2), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
    io::save_disparity(&DisparityMap::new(est, params.range()), est_dir.path().join("C_DSP.png"), 256.0)
        .unwrap();

    image::GrayImage::from_fn(2, 2, |x, y| image::Luma([(x + 2 * y) as u8]))
        .save(gt_dir.path().join("C_DSP.png"))
        .unwrap();

    let reports = io::evaluate_dir(est_dir.path(), gt_dir.path(), &params).unwrap();
    assert_relative_eq!(reports[0].epe, 0.0);
    assert_relative_eq!(reports[0].d1, 0.0);
}

#[test]
fn mismatched_directories_abort() {
    let left_dir = tempfile::tempdir().unwrap();
    let right_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    write_texture(&left_dir.path().join("A_LEFT_RGB.png"), 0);
    write_texture(&left_dir.path().join("B_LEFT_RGB.png"), 0);
    write_texture(&right_dir.path().join("A_RIGHT_RGB.png"), 2);

    let params = params();
    let net = StereoNetwork::classical(&params);

    assert!(matches!(
        io::predict_dir(&net, left_dir.path(), right_dir.path(), out_dir.path(), &params),
        Err(Error::FileCountMismatch { left_count: 2, right_count: 1, .. })
    ));
    assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 0);
}

//! # Evaluation metrics
//!
//! End-point error and D1 error rate between an estimated and a ground truth disparity raster.
//! Both rasters are multiplied by `scale` first, which converts normalised rasters back into
//! pixel units.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use ndarray::{ArrayView2, Zip};
use serde::Deserialize;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A pixel counts as erroneous when its absolute error exceeds `absolute` pixels and also
/// exceeds `relative` times the true disparity.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct D1Threshold {
    pub absolute: f32,
    pub relative: f32
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for D1Threshold {
    fn default() -> Self {
        Self {
            absolute: 3.0,
            relative: 0.05
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Mean absolute difference between the two rasters.
pub fn end_point_error(est: ArrayView2<f32>, gt: ArrayView2<f32>, scale: f32) -> Result<f32> {
    check_rasters(&est, &gt)?;

    let total = Zip::from(&est)
        .and(&gt)
        .fold(0.0f64, |acc, &e, &g| acc + ((e - g) * scale).abs() as f64);

    Ok((total / est.len() as f64) as f32)
}

/// Fraction of pixels whose error exceeds the threshold.
pub fn d1_error(
    est: ArrayView2<f32>,
    gt: ArrayView2<f32>,
    scale: f32,
    threshold: D1Threshold
) -> Result<f32> {
    check_rasters(&est, &gt)?;

    let bad = Zip::from(&est).and(&gt).fold(0usize, |acc, &e, &g| {
        let err = ((e - g) * scale).abs();
        let true_disp = (g * scale).abs();

        match err > threshold.absolute && err > threshold.relative * true_disp {
            true => acc + 1,
            false => acc
        }
    });

    Ok(bad as f32 / est.len() as f32)
}

fn check_rasters(est: &ArrayView2<f32>, gt: &ArrayView2<f32>) -> Result<()> {
    if est.shape() != gt.shape() {
        return Err(Error::ShapeMismatch {
            left: est.shape().to_vec(),
            right: gt.shape().to_vec()
        });
    }

    if est.is_empty() {
        return Err(Error::EmptyRaster);
    }

    Ok(())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr2, Array2};

    #[test]
    fn epe() {
        let est = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let gt = arr2(&[[1.0, 0.0], [4.0, 8.0]]);

        assert_relative_eq!(end_point_error(est.view(), gt.view(), 1.0).unwrap(), 7.0 / 4.0);
        assert_relative_eq!(end_point_error(est.view(), gt.view(), 2.0).unwrap(), 14.0 / 4.0);
        assert_relative_eq!(end_point_error(gt.view(), gt.view(), 1.0).unwrap(), 0.0);
    }

    #[test]
    fn d1() {
        // errors: 0, 4, 3.5, 100 against true disparities 0, 0, 100, 10
        let est = arr2(&[[0.0, 4.0], [103.5, 110.0]]);
        let gt = arr2(&[[0.0, 0.0], [100.0, 10.0]]);

        // 4 > 3 and 4 > 0; 3.5 > 3 but 3.5 < 5; 100 > 3 and 100 > 0.5
        let d1 = d1_error(est.view(), gt.view(), 1.0, D1Threshold::default()).unwrap();
        assert_relative_eq!(d1, 0.5);

        let strict = D1Threshold { absolute: 3.0, relative: 0.0 };
        let d1 = d1_error(est.view(), gt.view(), 1.0, strict).unwrap();
        assert_relative_eq!(d1, 0.75);
    }

    #[test]
    fn errors() {
        let a = Array2::<f32>::zeros((2, 2));
        let b = Array2::<f32>::zeros((2, 3));
        let empty = Array2::<f32>::zeros((0, 3));

        assert!(matches!(
            end_point_error(a.view(), b.view(), 1.0),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            d1_error(empty.view(), empty.view(), 1.0, D1Threshold::default()),
            Err(Error::EmptyRaster)
        ));
    }
}

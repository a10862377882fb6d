//! # Disparity regression
//!
//! Soft-argmin over a regularised cost volume `[batch, disparity, height, width]`: costs are
//! turned into a probability distribution over the disparity axis with a softmax of the negated
//! cost, and the disparity estimate is the expected candidate value under that distribution.
//!
//! Only exponentials, sums and weighted sums are involved, so the estimate is differentiable with
//! respect to the costs. [`soft_argmin_grad`] gives the backward pass.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::debug;
use ndarray::{Array3, Array4, ArrayView1, ArrayView3, ArrayView4, ArrayViewMut1, Axis, Zip};

use crate::disparity::{DisparityMap, DisparityRange};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Soft-argmin regressor for volumes built over `range`.
#[derive(Debug, Clone, Copy)]
pub struct SoftArgmin {
    pub range: DisparityRange
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl SoftArgmin {
    pub fn new(range: DisparityRange) -> Self {
        Self { range }
    }

    pub fn regress(&self, cost: ArrayView4<f32>) -> Result<DisparityMap> {
        soft_argmin(cost, self.range)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Probability of each candidate disparity, `softmax(-cost)` over axis 1.
pub fn disparity_probabilities(cost: ArrayView4<f32>) -> Array4<f32> {
    let mut probs = Array4::<f32>::zeros(cost.raw_dim());

    Zip::from(probs.lanes_mut(Axis(1)))
        .and(cost.lanes(Axis(1)))
        .par_for_each(|p, c| softmax_neg(c, p));

    probs
}

/// Expected disparity of every pixel of the cost volume.
pub fn soft_argmin(cost: ArrayView4<f32>, range: DisparityRange) -> Result<DisparityMap> {
    check_volume(&cost, range)?;

    let values = range.values();
    let (n, _, h, w) = cost.dim();
    let mut disp = Array3::<f32>::zeros((n, h, w));

    Zip::from(&mut disp)
        .and(cost.lanes(Axis(1)))
        .par_for_each(|out, c| *out = expected_value(c, &values));

    debug!("Regressed disparity over {} candidates for {:?}", values.len(), disp.shape());

    Ok(DisparityMap::new(disp, range))
}

/// Gradient of the soft-argmin output with respect to the cost volume.
///
/// `grad_output` is the upstream gradient `[batch, height, width]`. For a pixel with
/// probabilities `p`, candidate values `v` and estimate `e`, the gradient of cost `d` is
/// `-g * p[d] * (v[d] - e)`.
pub fn soft_argmin_grad(
    cost: ArrayView4<f32>,
    range: DisparityRange,
    grad_output: ArrayView3<f32>
) -> Result<Array4<f32>> {
    check_volume(&cost, range)?;

    let (n, _, h, w) = cost.dim();
    if grad_output.dim() != (n, h, w) {
        return Err(Error::ShapeMismatch {
            left: vec![n, h, w],
            right: grad_output.shape().to_vec()
        });
    }

    let values = range.values();
    let mut grad = Array4::<f32>::zeros(cost.raw_dim());

    Zip::from(grad.lanes_mut(Axis(1)))
        .and(cost.lanes(Axis(1)))
        .and(&grad_output)
        .par_for_each(|mut gl, c, &g| {
            softmax_neg(c, gl.view_mut());
            let expected: f32 = gl.iter().zip(values.iter()).map(|(p, v)| p * v).sum();

            for (gd, v) in gl.iter_mut().zip(values.iter()) {
                *gd = -g * *gd * (v - expected);
            }
        });

    Ok(grad)
}

fn check_volume(cost: &ArrayView4<f32>, range: DisparityRange) -> Result<()> {
    range.validate()?;

    let found = cost.len_of(Axis(1));
    if found != range.len() {
        return Err(Error::DisparityAxisMismatch { expected: range.len(), found });
    }

    Ok(())
}

/// Writes `softmax(-cost)` into `out`.
///
/// The maximum of `-cost` is subtracted before exponentiating, without it large cost magnitudes
/// overflow to infinity.
fn softmax_neg(cost: ArrayView1<f32>, mut out: ArrayViewMut1<f32>) {
    let max_neg = -cost.iter().cloned().fold(f32::INFINITY, f32::min);

    let mut sum = 0.0f32;
    for (o, &c) in out.iter_mut().zip(cost.iter()) {
        *o = weight(c, max_neg);
        sum += *o;
    }

    out.mapv_inplace(|e| e / sum);
}

fn expected_value(cost: ArrayView1<f32>, values: &[f32]) -> f32 {
    let max_neg = -cost.iter().cloned().fold(f32::INFINITY, f32::min);

    let mut sum = 0.0f32;
    let mut weighted = 0.0f32;
    for (&c, &v) in cost.iter().zip(values.iter()) {
        let e = weight(c, max_neg);
        sum += e;
        weighted += e * v;
    }

    weighted / sum
}

/// Unnormalised weight `exp(-cost - max_neg)`.
///
/// With a `-inf` cost in the lane only the `-inf` candidates keep weight, and a lane of `+inf`
/// costs is uniform. Both would be `inf - inf` otherwise.
fn weight(cost: f32, max_neg: f32) -> f32 {
    if max_neg == f32::INFINITY {
        if cost == f32::NEG_INFINITY { 1.0 } else { 0.0 }
    }
    else if max_neg == f32::NEG_INFINITY {
        1.0
    }
    else {
        (-cost - max_neg).exp()
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

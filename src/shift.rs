//! # Zero-filled shifting
//!
//! Both cost volume variants are built from one primitive: shift an array along an axis and
//! fill the vacated positions with zero. Content shifted past the boundary is discarded, it never
//! wraps around.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Slice};

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Shift `array` along `axis` by `k` positions.
///
/// The output has the same shape as the input and `out[.., j, ..] = array[.., j - k, ..]` where
/// `j - k` is in bounds, zero elsewhere. A positive `k` moves content towards higher indices.
pub fn shift_zero_fill<S, D>(array: &ArrayBase<S, D>, axis: usize, k: isize) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    D: Dimension
{
    if axis >= array.ndim() {
        return Err(Error::AxisOutOfRange { axis, ndim: array.ndim() });
    }

    let ax = Axis(axis);
    let len = array.len_of(ax);
    let n = k.unsigned_abs();

    let mut out = Array::zeros(array.raw_dim());

    if n >= len {
        return Ok(out);
    }

    if k >= 0 {
        out.slice_axis_mut(ax, Slice::from(n..))
            .assign(&array.slice_axis(ax, Slice::from(..len - n)));
    }
    else {
        out.slice_axis_mut(ax, Slice::from(..len - n))
            .assign(&array.slice_axis(ax, Slice::from(n..)));
    }

    Ok(out)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn shift_right_and_left() {
        let a = arr1(&[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(shift_zero_fill(&a, 0, 1).unwrap(), arr1(&[0.0, 1.0, 2.0, 3.0]));
        assert_eq!(shift_zero_fill(&a, 0, -2).unwrap(), arr1(&[3.0, 4.0, 0.0, 0.0]));
        assert_eq!(shift_zero_fill(&a, 0, 0).unwrap(), a);
    }

    #[test]
    fn shift_past_boundary_is_all_zero() {
        let a = arr1(&[1.0, 2.0, 3.0]);

        assert_eq!(shift_zero_fill(&a, 0, 3).unwrap(), arr1(&[0.0, 0.0, 0.0]));
        assert_eq!(shift_zero_fill(&a, 0, -7).unwrap(), arr1(&[0.0, 0.0, 0.0]));
    }

    #[test]
    fn shift_inner_axis() {
        let a = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        assert_eq!(
            shift_zero_fill(&a, 1, 1).unwrap(),
            arr2(&[[0.0, 1.0, 2.0], [0.0, 4.0, 5.0]])
        );
        assert_eq!(
            shift_zero_fill(&a, 0, -1).unwrap(),
            arr2(&[[4.0, 5.0, 6.0], [0.0, 0.0, 0.0]])
        );
    }

    #[test]
    fn bad_axis() {
        let a = arr1(&[1.0]);

        assert!(matches!(
            shift_zero_fill(&a, 1, 0),
            Err(Error::AxisOutOfRange { axis: 1, ndim: 1 })
        ));
    }
}

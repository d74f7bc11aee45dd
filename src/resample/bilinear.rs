//! Bilinear interpolation kernel.

use ndarray::ArrayView2;
use num_traits::NumCast;

/// Lower node index and fraction along one axis of `n` nodes.
///
/// The far edge belongs to the last cell, so `x == n-1` interpolates with
/// weight 1 on the last node. A single-node axis only accepts `x == 0`.
fn axis(x: f64, n: usize) -> Option<(usize, usize, f64)> {
    let last = n.checked_sub(1)? as f64;
    if !(0.0..=last).contains(&x) {
        return None;
    }
    if n == 1 {
        return Some((0, 0, 0.0));
    }
    let i0 = (x.floor() as usize).min(n - 2);
    Some((i0, i0 + 1, x - i0 as f64))
}

/// Sample a 2D array of nodes using bilinear interpolation.
///
/// `x` is the fractional column, `y` the fractional row. Returns `None` if the
/// point is outside the node range or any of the four neighbours is NaN or
/// equal to `nodata`.
pub fn sample<T>(src: &ArrayView2<'_, T>, x: f64, y: f64, nodata: Option<T>) -> Option<T>
where
    T: Copy + NumCast + PartialEq,
{
    let (x0, x1, dx) = axis(x, src.ncols())?;
    let (y0, y1, dy) = axis(y, src.nrows())?;

    let v00 = src[(y0, x0)];
    let v10 = src[(y0, x1)];
    let v01 = src[(y1, x0)];
    let v11 = src[(y1, x1)];

    // Check nodata
    if let Some(nd) = nodata {
        if v00 == nd || v10 == nd || v01 == nd || v11 == nd {
            return None;
        }
    }

    // Convert to f64 for interpolation
    let f00: f64 = NumCast::from(v00)?;
    let f10: f64 = NumCast::from(v10)?;
    let f01: f64 = NumCast::from(v01)?;
    let f11: f64 = NumCast::from(v11)?;

    if f00.is_nan() || f10.is_nan() || f01.is_nan() || f11.is_nan() {
        return None;
    }

    let result = f00 * (1.0 - dx) * (1.0 - dy)
        + f10 * dx * (1.0 - dy)
        + f01 * (1.0 - dx) * dy
        + f11 * dx * dy;

    NumCast::from(result)
}

//! Nearest-node kernel.

use ndarray::ArrayView2;

/// Sample a 2D array of nodes by rounding to the closest node.
///
/// Halfway points round away from zero. Returns `None` outside the node
/// range or when the node equals `nodata`.
pub fn sample<T>(src: &ArrayView2<'_, T>, x: f64, y: f64, nodata: Option<T>) -> Option<T>
where
    T: Copy + PartialEq,
{
    let (rows, cols) = (src.nrows() as f64, src.ncols() as f64);
    if !(0.0..=cols - 1.0).contains(&x) || !(0.0..=rows - 1.0).contains(&y) {
        return None;
    }

    let val = src[(y.round() as usize, x.round() as usize)];

    if let Some(nd) = nodata {
        if val == nd {
            return None;
        }
    }

    Some(val)
}

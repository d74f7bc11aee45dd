//! PyO3 binding for correction-grid lookups.

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use super::to_py;
use crate::grid::{FileGeo, GridOptions, OutOfBounds};
use crate::resample::InterpolationMethod;

/// Interpolate a grid file at (lat, lon) points given in degrees.
///
/// Points without a value (outside the grid, or touching `nodata` nodes)
/// come back as NaN unless `strict` is set, in which case the first such
/// point raises `ValueError`.
#[pyfunction]
#[pyo3(signature = (path, lat, lon, method="bilinear", clamp=false, nodata=None, strict=false))]
#[allow(clippy::too_many_arguments)]
pub fn grid_values<'py>(
    py: Python<'py>,
    path: &str,
    lat: PyReadonlyArray1<'py, f64>,
    lon: PyReadonlyArray1<'py, f64>,
    method: &str,
    clamp: bool,
    nodata: Option<f32>,
    strict: bool,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let method = InterpolationMethod::from_name(method)
        .ok_or_else(|| PyValueError::new_err(format!("unknown interpolation method: {method}")))?;
    let options = GridOptions {
        method,
        out_of_bounds: if clamp {
            OutOfBounds::Clamp
        } else {
            OutOfBounds::Fail
        },
        nodata,
    };

    let (lat, lon) = (lat.as_array(), lon.as_array());
    if lat.len() != lon.len() {
        return Err(PyValueError::new_err(format!(
            "lat and lon must have same length, got {} and {}",
            lat.len(),
            lon.len()
        )));
    }
    let points: Vec<(f64, f64)> = lat
        .iter()
        .zip(lon.iter())
        .map(|(&la, &lo)| (la.to_radians(), lo.to_radians()))
        .collect();
    let path = path.to_string();

    let values = py.allow_threads(move || -> PyResult<Vec<f64>> {
        let grid = FileGeo::open_with(&path, options).map_err(to_py)?;
        grid.values_at(&points)
            .into_iter()
            .map(|r| match r {
                Ok(v) => Ok(v),
                Err(e) if strict => Err(to_py(e)),
                Err(_) => Ok(f64::NAN),
            })
            .collect()
    })?;

    Ok(PyArray1::from_owned_array(py, ndarray::Array1::from(values)))
}

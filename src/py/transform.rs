//! PyO3 bindings for batch projection of coordinate arrays.

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use super::to_py;
use crate::proj::{self, Ellipsoid, Params, Projection};

/// Build a projection from Python-side arguments (angles in degrees).
#[allow(clippy::too_many_arguments)]
fn build(
    projection: &str,
    ellipsoid: &str,
    k0: f64,
    ref_lat: f64,
    ref_lon: f64,
    false_east: f64,
    false_north: f64,
    unit: f64,
    skew_azimuth: f64,
) -> PyResult<Box<dyn Projection>> {
    let ellipsoid = Ellipsoid::named(ellipsoid).map_err(to_py)?;
    let params = Params::builder(ellipsoid)
        .k0(k0)
        .ref_latitude(ref_lat.to_radians())
        .ref_longitude(ref_lon.to_radians())
        .false_east(false_east)
        .false_north(false_north)
        .unit(unit)
        .skew_azimuth(skew_azimuth.to_radians())
        .build()
        .map_err(to_py)?;
    proj::from_name(projection, params).map_err(to_py)
}

fn pairs(a: &PyReadonlyArray1<'_, f64>, b: &PyReadonlyArray1<'_, f64>) -> PyResult<Vec<(f64, f64)>> {
    let (a, b) = (a.as_array(), b.as_array());
    if a.len() != b.len() {
        return Err(PyValueError::new_err(format!(
            "coordinate arrays must have same length, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b.iter()).map(|(&ai, &bi)| (ai, bi)).collect())
}

#[allow(clippy::type_complexity)]
fn unzip<'py>(
    py: Python<'py>,
    coords: Vec<(f64, f64)>,
) -> (Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>) {
    let (a, b): (Vec<f64>, Vec<f64>) = coords.into_iter().unzip();
    (
        PyArray1::from_owned_array(py, ndarray::Array1::from(a)),
        PyArray1::from_owned_array(py, ndarray::Array1::from(b)),
    )
}

/// Project geographic coordinates (degrees) to grid coordinates.
///
/// Returns:
///     Tuple of (x, y) arrays in the projection's linear unit.
#[pyfunction]
#[pyo3(signature = (lat, lon, projection, ellipsoid="WGS84", k0=1.0, ref_lat=0.0, ref_lon=0.0,
    false_east=0.0, false_north=0.0, unit=1.0, skew_azimuth=0.0))]
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn project_points<'py>(
    py: Python<'py>,
    lat: PyReadonlyArray1<'py, f64>,
    lon: PyReadonlyArray1<'py, f64>,
    projection: &str,
    ellipsoid: &str,
    k0: f64,
    ref_lat: f64,
    ref_lon: f64,
    false_east: f64,
    false_north: f64,
    unit: f64,
    skew_azimuth: f64,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
    let proj = build(
        projection, ellipsoid, k0, ref_lat, ref_lon, false_east, false_north, unit, skew_azimuth,
    )?;
    let mut coords: Vec<(f64, f64)> = pairs(&lat, &lon)?
        .into_iter()
        .map(|(la, lo)| (la.to_radians(), lo.to_radians()))
        .collect();

    let coords = py.allow_threads(move || -> PyResult<Vec<(f64, f64)>> {
        proj.geo_xy_batch(&mut coords).map_err(to_py)?;
        Ok(coords)
    })?;
    Ok(unzip(py, coords))
}

/// Inverse of `project_points`: grid coordinates to (lat, lon) in degrees.
#[pyfunction]
#[pyo3(signature = (x, y, projection, ellipsoid="WGS84", k0=1.0, ref_lat=0.0, ref_lon=0.0,
    false_east=0.0, false_north=0.0, unit=1.0, skew_azimuth=0.0))]
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn unproject_points<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<'py, f64>,
    y: PyReadonlyArray1<'py, f64>,
    projection: &str,
    ellipsoid: &str,
    k0: f64,
    ref_lat: f64,
    ref_lon: f64,
    false_east: f64,
    false_north: f64,
    unit: f64,
    skew_azimuth: f64,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
    let proj = build(
        projection, ellipsoid, k0, ref_lat, ref_lon, false_east, false_north, unit, skew_azimuth,
    )?;
    let mut coords = pairs(&x, &y)?;

    let coords = py.allow_threads(move || -> PyResult<Vec<(f64, f64)>> {
        proj.xy_geo_batch(&mut coords).map_err(to_py)?;
        Ok(coords
            .into_iter()
            .map(|(la, lo)| (la.to_degrees(), lo.to_degrees()))
            .collect())
    })?;
    Ok(unzip(py, coords))
}

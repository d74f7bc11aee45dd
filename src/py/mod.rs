use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::GeoError;

mod grid;
mod transform;

/// Register all Python-visible functions.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(transform::project_points, m)?)?;
    m.add_function(wrap_pyfunction!(transform::unproject_points, m)?)?;
    m.add_function(wrap_pyfunction!(grid::grid_values, m)?)?;
    Ok(())
}

impl From<GeoError> for PyErr {
    fn from(e: GeoError) -> Self {
        PyValueError::new_err(e.to_string())
    }
}

/// Lift a core error to a Python `ValueError`.
fn to_py<E: Into<GeoError>>(e: E) -> PyErr {
    e.into().into()
}

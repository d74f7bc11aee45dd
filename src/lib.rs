//! Geodetic conversions: reference ellipsoids, seven-parameter datum shifts,
//! a family of map projections and geoid correction grids.
//!
//! Angles are radians throughout the Rust API; the optional Python bindings
//! (feature `python`) take and return degrees.

pub mod datum;
pub mod error;
pub mod grid;
pub mod proj;
pub mod resample;

#[cfg(feature = "python")]
mod py;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// A Python module implemented in Rust.
#[cfg(feature = "python")]
#[pymodule]
fn _rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    py::register(m)?;
    Ok(())
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Projection error: {0}")]
    Projection(#[from] ProjError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}

/// Failures of the math core: ellipsoids, datum shifts and projections.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjError {
    #[error("Point outside projection domain: {0}")]
    OutOfDomain(String),

    #[error("Iteration did not converge: {0}")]
    NoConvergence(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown projection: {0}")]
    UnknownProjection(String),

    #[error("Unknown ellipsoid: {0}")]
    UnknownEllipsoid(String),
}

/// Failures while reading, writing or sampling a correction grid.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid format: {0}")]
    Format(String),

    #[error("Point outside grid limits: lat={lat:.6}°, lon={lon:.6}°")]
    OutOfBounds { lat: f64, lon: f64 },

    #[error("No data at lat={lat:.6}°, lon={lon:.6}°")]
    NoData { lat: f64, lon: f64 },

    #[error("Grid level {0} does not exist")]
    InvalidLevel(usize),
}

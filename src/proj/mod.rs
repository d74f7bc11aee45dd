pub mod cassini;
pub mod common;
pub mod ellipsoid;
pub mod hotine;
pub mod oblique;
pub mod params;
pub mod plate_carree;
pub mod polyconic;
pub mod rso;
pub mod transverse_mercator;

use crate::error::ProjError;

pub use common::lon_adjust;
pub use ellipsoid::{Ellipsoid, StandardEllipsoid};
pub use params::{Params, ParamsBuilder};

/// Trait for map projections supporting forward and inverse transforms.
///
/// All angles are radians; planar coordinates are in the linear unit of the
/// projection's [`Params`], offset by its false origin. Implementations hold
/// only constants precomputed at construction, so every call is a pure
/// function of its arguments.
pub trait Projection: Send + Sync {
    /// Forward: (lat_rad, lon_rad) -> (easting, northing)
    fn geo_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjError>;

    /// Inverse: (easting, northing) -> (lat_rad, lon_rad)
    fn xy_geo(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError>;

    /// Point scale factor at (lat_rad, lon_rad).
    fn k(&self, lat: f64, lon: f64) -> Result<f64, ProjError>;

    fn params(&self) -> &Params;

    fn ellipsoid(&self) -> &Ellipsoid {
        self.params().ellipsoid()
    }

    /// Batch forward transform on (lat, lon) pairs, in place.
    fn geo_xy_batch(&self, coords: &mut [(f64, f64)]) -> Result<(), ProjError> {
        for c in coords.iter_mut() {
            *c = self.geo_xy(c.0, c.1)?;
        }
        Ok(())
    }

    /// Batch inverse transform on (x, y) pairs, in place.
    fn xy_geo_batch(&self, coords: &mut [(f64, f64)]) -> Result<(), ProjError> {
        for c in coords.iter_mut() {
            *c = self.xy_geo(c.0, c.1)?;
        }
        Ok(())
    }
}

/// The implemented projection family, for choosing a projection by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionKind {
    TransverseMercator,
    Cassini,
    Polyconic,
    PlateCarree,
    Hotine,
    Rso,
}

impl ProjectionKind {
    /// Parse from a string name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "transverse_mercator" | "transversemercator" | "tm" | "tmerc" => {
                Some(Self::TransverseMercator)
            }
            "cassini" | "cassini_soldner" | "cass" => Some(Self::Cassini),
            "polyconic" | "american_polyconic" | "poly" => Some(Self::Polyconic),
            "plate_carree" | "platecarree" | "equirectangular" | "eqc" => Some(Self::PlateCarree),
            "hotine" | "hotine_oblique_mercator" | "omerc" => Some(Self::Hotine),
            "rso" | "rectified_skew_orthomorphic" => Some(Self::Rso),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TransverseMercator => "transverse_mercator",
            Self::Cassini => "cassini",
            Self::Polyconic => "polyconic",
            Self::PlateCarree => "plate_carree",
            Self::Hotine => "hotine",
            Self::Rso => "rso",
        }
    }

    /// Construct the projection behind a trait object.
    pub fn build(self, params: Params) -> Result<Box<dyn Projection>, ProjError> {
        Ok(match self {
            Self::TransverseMercator => {
                Box::new(transverse_mercator::TransverseMercator::new(params))
            }
            Self::Cassini => Box::new(cassini::Cassini::new(params)),
            Self::Polyconic => Box::new(polyconic::Polyconic::new(params)),
            Self::PlateCarree => Box::new(plate_carree::PlateCarree::new(params)?),
            Self::Hotine => Box::new(hotine::Hotine::new(params)?),
            Self::Rso => Box::new(rso::Rso::new(params)?),
        })
    }
}

/// Build a projection from its name and parameters.
pub fn from_name(name: &str, params: Params) -> Result<Box<dyn Projection>, ProjError> {
    ProjectionKind::from_name(name)
        .ok_or_else(|| ProjError::UnknownProjection(name.to_string()))?
        .build(params)
}

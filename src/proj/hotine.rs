//! Hotine Oblique Mercator.
//!
//! Skewed coordinates are rectified with the skew azimuth of the central
//! line at the projection centre, so grid north follows the central line's
//! azimuth there rather than true north.

use crate::error::ProjError;
use crate::proj::oblique::{ObliqueMercator, Rectification};
use crate::proj::params::Params;
use crate::proj::Projection;

pub struct Hotine {
    inner: ObliqueMercator,
}

impl Hotine {
    pub fn new(params: Params) -> Result<Self, ProjError> {
        Ok(Self {
            inner: ObliqueMercator::new(params, Rectification::SkewAzimuth)?,
        })
    }

    /// Skewed (u, v) metres, u measured along the central line from the centre.
    pub fn skew(&self, x: f64, y: f64) -> (f64, f64) {
        self.inner.skew(x, y)
    }

    /// Grid (x, y) from skewed (u, v) metres.
    pub fn deskew(&self, u: f64, v: f64) -> (f64, f64) {
        self.inner.deskew(u, v)
    }

    pub fn gama0(&self) -> f64 {
        self.inner.gama0()
    }

    pub fn lambda0(&self) -> f64 {
        self.inner.lambda0()
    }
}

impl Projection for Hotine {
    fn geo_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjError> {
        self.inner.geo_xy(lat, lon)
    }

    fn xy_geo(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        self.inner.xy_geo(x, y)
    }

    fn k(&self, lat: f64, lon: f64) -> Result<f64, ProjError> {
        self.inner.k(lat, lon)
    }

    fn params(&self) -> &Params {
        self.inner.params()
    }
}

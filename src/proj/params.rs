//! Projection parameters and their builder.
//!
//! `Params` carries everything a concrete projection needs that does not
//! depend on the coordinate being converted: the reference ellipsoid, the
//! central scale factor, the reference point, the false origin and the
//! linear unit. It is validated once in [`ParamsBuilder::build`]; projection
//! constructors trust it afterwards.

use std::f64::consts::FRAC_PI_2;

use super::ellipsoid::{Ellipsoid, WGS84};
use crate::error::ProjError;

/// Immutable projection configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    ellipsoid: Ellipsoid,
    k0: f64,
    ref_latitude: f64,
    ref_longitude: f64,
    false_east: f64,
    false_north: f64,
    unit: f64,
    skew_azimuth: f64,
}

impl Params {
    pub fn builder(ellipsoid: Ellipsoid) -> ParamsBuilder {
        ParamsBuilder::new(ellipsoid)
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Central scale factor.
    pub fn k0(&self) -> f64 {
        self.k0
    }

    /// Reference (origin or centre) latitude, radians.
    pub fn ref_latitude(&self) -> f64 {
        self.ref_latitude
    }

    /// Reference (central meridian or centre) longitude, radians.
    pub fn ref_longitude(&self) -> f64 {
        self.ref_longitude
    }

    /// False easting, in output linear units.
    pub fn false_east(&self) -> f64 {
        self.false_east
    }

    /// False northing, in output linear units.
    pub fn false_north(&self) -> f64 {
        self.false_north
    }

    /// Size of one output linear unit in metres.
    pub fn unit(&self) -> f64 {
        self.unit
    }

    /// Azimuth of the central line at the projection centre (oblique projections).
    pub fn skew_azimuth(&self) -> f64 {
        self.skew_azimuth
    }

    /// Metres relative to the natural origin -> output grid coordinates.
    pub fn to_grid(&self, xm: f64, ym: f64) -> (f64, f64) {
        (
            xm / self.unit + self.false_east,
            ym / self.unit + self.false_north,
        )
    }

    /// Output grid coordinates -> metres relative to the natural origin.
    pub fn from_grid(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.false_east) * self.unit,
            (y - self.false_north) * self.unit,
        )
    }
}

impl Default for Params {
    fn default() -> Self {
        ParamsBuilder::new(WGS84).raw()
    }
}

/// Chaining builder for [`Params`].
///
/// ```
/// use geotrans::proj::ellipsoid::CLARKE_1866;
/// use geotrans::proj::params::Params;
///
/// let params = Params::builder(CLARKE_1866)
///     .k0(0.9996)
///     .ref_longitude((-75.0_f64).to_radians())
///     .build()
///     .unwrap();
/// assert_eq!(params.k0(), 0.9996);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ParamsBuilder {
    ellipsoid: Ellipsoid,
    k0: f64,
    ref_latitude: f64,
    ref_longitude: f64,
    false_east: f64,
    false_north: f64,
    unit: f64,
    skew_azimuth: f64,
}

impl ParamsBuilder {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self {
            ellipsoid,
            k0: 1.0,
            ref_latitude: 0.0,
            ref_longitude: 0.0,
            false_east: 0.0,
            false_north: 0.0,
            unit: 1.0,
            skew_azimuth: 0.0,
        }
    }

    pub fn ellipsoid(mut self, ellipsoid: Ellipsoid) -> Self {
        self.ellipsoid = ellipsoid;
        self
    }

    pub fn k0(mut self, v: f64) -> Self {
        self.k0 = v;
        self
    }

    /// Radians.
    pub fn ref_latitude(mut self, v: f64) -> Self {
        self.ref_latitude = v;
        self
    }

    /// Radians.
    pub fn ref_longitude(mut self, v: f64) -> Self {
        self.ref_longitude = v;
        self
    }

    pub fn false_east(mut self, v: f64) -> Self {
        self.false_east = v;
        self
    }

    pub fn false_north(mut self, v: f64) -> Self {
        self.false_north = v;
        self
    }

    /// Metres per output unit (1 for metres, 0.3048 for international feet).
    pub fn unit(mut self, v: f64) -> Self {
        self.unit = v;
        self
    }

    /// Radians, clockwise from north.
    pub fn skew_azimuth(mut self, v: f64) -> Self {
        self.skew_azimuth = v;
        self
    }

    pub fn build(self) -> Result<Params, ProjError> {
        let finite = [
            ("k0", self.k0),
            ("ref_latitude", self.ref_latitude),
            ("ref_longitude", self.ref_longitude),
            ("false_east", self.false_east),
            ("false_north", self.false_north),
            ("unit", self.unit),
            ("skew_azimuth", self.skew_azimuth),
        ];
        if let Some((name, v)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ProjError::InvalidParameter(format!("{name} is not finite: {v}")));
        }
        if self.k0 <= 0.0 {
            return Err(ProjError::InvalidParameter(format!(
                "k0 must be positive, got {}",
                self.k0
            )));
        }
        if self.unit <= 0.0 {
            return Err(ProjError::InvalidParameter(format!(
                "unit must be positive, got {}",
                self.unit
            )));
        }
        if self.ref_latitude.abs() > FRAC_PI_2 {
            return Err(ProjError::InvalidParameter(format!(
                "ref_latitude outside [-90°, 90°]: {}°",
                self.ref_latitude.to_degrees()
            )));
        }
        // Re-validate the ellipsoid: free-form ones skip checks at construction.
        Ellipsoid::try_new(self.ellipsoid.a(), self.ellipsoid.f())?;
        Ok(self.raw())
    }

    fn raw(self) -> Params {
        Params {
            ellipsoid: self.ellipsoid,
            k0: self.k0,
            ref_latitude: self.ref_latitude,
            ref_longitude: self.ref_longitude,
            false_east: self.false_east,
            false_north: self.false_north,
            unit: self.unit,
            skew_azimuth: self.skew_azimuth,
        }
    }
}

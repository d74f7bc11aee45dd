//! Transverse Mercator projection using Snyder's ellipsoidal series.
//!
//! Forward uses the A-power series of Snyder (8-9 .. 8-11), inverse the
//! footpoint-latitude series (8-12 .. 8-18). Accuracy is millimetric within a
//! few degrees of the central meridian; the series are not meant for use past
//! roughly 10°, and points more than 90° away are rejected outright.

use std::f64::consts::FRAC_PI_2;

use crate::error::ProjError;
use crate::proj::common::{
    check_latitude, check_longitude, footpoint_latitude, is_polar, lon_adjust, meridional_arc,
};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::params::Params;
use crate::proj::Projection;

/// Largest longitude offset from the central meridian accepted by the forward.
pub const MAX_LON_OFFSET: f64 = FRAC_PI_2;

pub struct TransverseMercator {
    params: Params,
    // Precomputed constants
    e2: f64,
    ep2: f64,
    m0: f64, // meridional arc at the reference latitude
}

impl TransverseMercator {
    pub fn new(params: Params) -> Self {
        let ellipsoid = params.ellipsoid();
        Self {
            e2: ellipsoid.e2(),
            ep2: ellipsoid.ep2(),
            m0: meridional_arc(ellipsoid, params.ref_latitude()),
            params,
        }
    }

    /// Create a Transverse Mercator for a UTM zone.
    pub fn utm(zone: u8, north: bool, ellipsoid: Ellipsoid) -> Result<Self, ProjError> {
        if !(1..=60).contains(&zone) {
            return Err(ProjError::InvalidParameter(format!(
                "UTM zone must be in 1..=60, got {zone}"
            )));
        }
        let lon0 = (6.0 * zone as f64 - 183.0).to_radians();
        let false_north = if north { 0.0 } else { 10_000_000.0 };
        let params = Params::builder(ellipsoid)
            .k0(0.9996)
            .ref_longitude(lon0)
            .false_east(500_000.0)
            .false_north(false_north)
            .build()?;
        Ok(Self::new(params))
    }

    /// Series terms shared by the forward and the scale factor:
    /// (N, T, C, A) of Snyder 8-9.
    fn terms(&self, lat: f64, lon: f64) -> Result<(f64, f64, f64, f64), ProjError> {
        check_latitude(lat)?;
        let dlam = lon_adjust(lon - self.params.ref_longitude());
        if dlam.abs() > MAX_LON_OFFSET {
            return Err(ProjError::OutOfDomain(format!(
                "{:.3}° from the central meridian",
                dlam.to_degrees()
            )));
        }
        let (sin_lat, cos_lat) = lat.sin_cos();
        let n = self.ellipsoid().a() / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
        let t = lat.tan().powi(2);
        let c = self.ep2 * cos_lat * cos_lat;
        let a = dlam * cos_lat;
        Ok((n, t, c, a))
    }
}

impl Projection for TransverseMercator {
    fn geo_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjError> {
        check_longitude(lon)?;
        let k0 = self.params.k0();
        if is_polar(lat) {
            check_latitude(lat)?;
            let m = meridional_arc(self.ellipsoid(), FRAC_PI_2.copysign(lat));
            return Ok(self.params.to_grid(0.0, k0 * (m - self.m0)));
        }

        let (n, t, c, a) = self.terms(lat, lon)?;
        let ep2 = self.ep2;
        let m = meridional_arc(self.ellipsoid(), lat);
        let a2 = a * a;

        let x = k0
            * n
            * (a + (1.0 - t + c) * a2 * a / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a2 * a2 * a / 120.0);
        let y = k0
            * (m - self.m0
                + n * lat.tan()
                    * (a2 / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a2 * a2 / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a2 * a2 * a2
                            / 720.0));

        Ok(self.params.to_grid(x, y))
    }

    fn xy_geo(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let k0 = self.params.k0();
        let lon0 = self.params.ref_longitude();
        let (xm, ym) = self.params.from_grid(x, y);

        let phi1 = footpoint_latitude(self.ellipsoid(), self.m0 + ym / k0)?;
        if is_polar(phi1) {
            return Ok((phi1, lon_adjust(lon0)));
        }

        let ep2 = self.ep2;
        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = phi1.tan();
        let w2 = 1.0 - self.e2 * sin1 * sin1;
        let c1 = ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let n1 = self.ellipsoid().a() / w2.sqrt();
        let r1 = self.ellipsoid().a() * (1.0 - self.e2) / (w2 * w2.sqrt());
        let d = xm / (n1 * k0);
        let d2 = d * d;

        let lat = phi1
            - (n1 * tan1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d2 * d2 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d2
                        * d2
                        * d2
                        / 720.0);
        let lon = lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d2 * d / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d2
                    * d2
                    * d
                    / 120.0)
                / cos1;

        Ok((lat, lon_adjust(lon)))
    }

    fn k(&self, lat: f64, lon: f64) -> Result<f64, ProjError> {
        check_longitude(lon)?;
        let k0 = self.params.k0();
        if is_polar(lat) {
            check_latitude(lat)?;
            return Ok(k0);
        }
        let (_, t, c, a) = self.terms(lat, lon)?;
        let a2 = a * a;
        Ok(k0
            * (1.0
                + (1.0 + c) * a2 / 2.0
                + (5.0 - 4.0 * t + 42.0 * c + 13.0 * c * c - 28.0 * self.ep2) * a2 * a2 / 24.0
                + (61.0 - 148.0 * t + 16.0 * t * t) * a2 * a2 * a2 / 720.0))
    }

    fn params(&self) -> &Params {
        &self.params
    }
}

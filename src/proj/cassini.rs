//! Cassini-Soldner projection (ellipsoidal, Snyder 13-1 .. 13-11).
//!
//! Equidistant along the central meridian and along lines perpendicular to it.
//! The scale factor reported by [`Cassini::k`] is the meridian scale
//! `1 + x²/(2ρ₁ν₁)` taken at the footpoint latitude; it is the largest
//! principal scale and good to about 1e-6 within a few degrees of the
//! central meridian.

use std::f64::consts::FRAC_PI_2;

use crate::error::ProjError;
use crate::proj::common::{
    check_latitude, check_longitude, footpoint_latitude, is_polar, lon_adjust, meridional_arc,
};
use crate::proj::params::Params;
use crate::proj::Projection;

pub struct Cassini {
    params: Params,
    e2: f64,
    ep2: f64,
    m0: f64,
}

impl Cassini {
    pub fn new(params: Params) -> Self {
        let ellipsoid = params.ellipsoid();
        Self {
            e2: ellipsoid.e2(),
            ep2: ellipsoid.ep2(),
            m0: meridional_arc(ellipsoid, params.ref_latitude()),
            params,
        }
    }

    /// Natural (unscaled, unshifted) coordinates in metres.
    fn natural(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjError> {
        check_latitude(lat)?;
        check_longitude(lon)?;
        if is_polar(lat) {
            let m = meridional_arc(self.ellipsoid(), FRAC_PI_2.copysign(lat));
            return Ok((0.0, m - self.m0));
        }
        let dlam = lon_adjust(lon - self.params.ref_longitude());
        if dlam.abs() > FRAC_PI_2 {
            return Err(ProjError::OutOfDomain(format!(
                "{:.3}° from the central meridian",
                dlam.to_degrees()
            )));
        }

        let (sin_lat, cos_lat) = lat.sin_cos();
        let tan_lat = lat.tan();
        let n = self.ellipsoid().a() / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = self.ep2 * cos_lat * cos_lat;
        let a = dlam * cos_lat;
        let a2 = a * a;

        let x = n * (a - t * a2 * a / 6.0 - (8.0 - t + 8.0 * c) * t * a2 * a2 * a / 120.0);
        let y = meridional_arc(self.ellipsoid(), lat) - self.m0
            + n * tan_lat * (a2 / 2.0 + (5.0 - t + 6.0 * c) * a2 * a2 / 24.0);
        Ok((x, y))
    }

    /// Footpoint latitude with its radii of curvature (ρ₁, ν₁).
    fn footpoint(&self, ym: f64) -> Result<(f64, f64, f64), ProjError> {
        let phi1 = footpoint_latitude(self.ellipsoid(), self.m0 + ym)?;
        let ellipsoid = self.ellipsoid();
        Ok((
            phi1,
            ellipsoid.meridian_radius(phi1),
            ellipsoid.prime_vertical_radius(phi1),
        ))
    }
}

impl Projection for Cassini {
    fn geo_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjError> {
        let (x, y) = self.natural(lat, lon)?;
        let k0 = self.params.k0();
        Ok(self.params.to_grid(k0 * x, k0 * y))
    }

    fn xy_geo(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let k0 = self.params.k0();
        let lon0 = self.params.ref_longitude();
        let (xm, ym) = self.params.from_grid(x, y);
        let (phi1, r1, n1) = self.footpoint(ym / k0)?;
        if is_polar(phi1) {
            return Ok((phi1, lon_adjust(lon0)));
        }

        let tan1 = phi1.tan();
        let t1 = tan1 * tan1;
        let d = xm / (k0 * n1);
        let d2 = d * d;

        let lat = phi1 - (n1 * tan1 / r1) * (d2 / 2.0 - (1.0 + 3.0 * t1) * d2 * d2 / 24.0);
        let lon = lon0
            + (d - t1 * d2 * d / 3.0 + (1.0 + 3.0 * t1) * t1 * d2 * d2 * d / 15.0) / phi1.cos();
        Ok((lat, lon_adjust(lon)))
    }

    fn k(&self, lat: f64, lon: f64) -> Result<f64, ProjError> {
        let (x, y) = self.natural(lat, lon)?;
        let (_, r1, n1) = self.footpoint(y)?;
        Ok(self.params.k0() * (1.0 + x * x / (2.0 * r1 * n1)))
    }

    fn params(&self) -> &Params {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::CLARKE_1866;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn snyder_cassini() -> Cassini {
        let params = Params::builder(CLARKE_1866)
            .ref_latitude(40.0_f64.to_radians())
            .ref_longitude((-75.0_f64).to_radians())
            .build()
            .unwrap();
        Cassini::new(params)
    }

    #[test]
    fn test_snyder_reference_point() {
        // Snyder, Map Projections: A Working Manual, p. 284
        let proj = snyder_cassini();
        let (x, y) = proj
            .geo_xy(43.0_f64.to_radians(), (-73.0_f64).to_radians())
            .unwrap();
        assert_abs_diff_eq!(x, 163_071.1, epsilon = 0.1);
        assert_abs_diff_eq!(y, 335_127.6, epsilon = 0.1);
    }

    #[test]
    fn test_snyder_reference_inverse() {
        let proj = snyder_cassini();
        let (lat, lon) = proj.xy_geo(163_071.128, 335_127.588).unwrap();
        assert_abs_diff_eq!(lat, 43.0_f64.to_radians(), epsilon = 1e-8);
        assert_abs_diff_eq!(lon, (-73.0_f64).to_radians(), epsilon = 1e-8);
    }

    #[test]
    fn test_roundtrip_within_three_degrees() {
        let proj = snyder_cassini();
        for lat_deg in [-80.0_f64, -45.0, 0.0, 10.0, 45.0, 60.0, 80.0] {
            for dlon in [-3.0_f64, -1.0, 0.5, 2.0, 3.0] {
                let lat = lat_deg.to_radians();
                let lon = (-75.0 + dlon).to_radians();
                let (x, y) = proj.geo_xy(lat, lon).unwrap();
                let (lat2, lon2) = proj.xy_geo(x, y).unwrap();
                assert_abs_diff_eq!(lat2, lat, epsilon = 1e-8);
                assert_abs_diff_eq!(lon2, lon, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_central_meridian_is_equidistant() {
        let proj = snyder_cassini();
        let lat = 52.0_f64.to_radians();
        let (x, y) = proj.geo_xy(lat, (-75.0_f64).to_radians()).unwrap();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            y,
            meridional_arc(&CLARKE_1866, lat) - meridional_arc(&CLARKE_1866, 40.0_f64.to_radians()),
            epsilon = 1e-6
        );
        assert_relative_eq!(proj.k(lat, (-75.0_f64).to_radians()).unwrap(), 1.0);
    }

    #[test]
    fn test_scale_factor_off_meridian() {
        // Meridian scale from a numerical derivative of the forward series.
        let proj = snyder_cassini();
        let k = proj
            .k(43.0_f64.to_radians(), (-73.0_f64).to_radians())
            .unwrap();
        assert_abs_diff_eq!(k, 1.000_326_9, epsilon = 1e-6);
        let k = proj
            .k(10.0_f64.to_radians(), (-72.0_f64).to_radians())
            .unwrap();
        assert_abs_diff_eq!(k, 1.001_339_6, epsilon = 5e-6);
    }

    #[test]
    fn test_far_longitude_is_out_of_domain() {
        let proj = snyder_cassini();
        assert!(matches!(
            proj.geo_xy(0.5, 1.0),
            Err(ProjError::OutOfDomain(_))
        ));
    }
}

//! Oblique Mercator core shared by [`Hotine`](super::hotine::Hotine) and
//! [`Rso`](super::rso::Rso).
//!
//! The ellipsoid is mapped conformally onto an aposphere of constant total
//! curvature (constants `A`, `B`, `H`), then onto an oblique cylinder tangent
//! along the central line through the projection centre. That gives skewed
//! natural coordinates `(u, v)`: `u` runs along the central line and `v`
//! across it. `u` is measured from the projection centre, so the centre maps
//! to the false origin.
//!
//! Rectification rotates `(u, v)` into grid `(x, y)`:
//!
//!   x = v·cosγ + u·sinγ,   y = u·cosγ - v·sinγ
//!
//! The two variants differ only in γ: Hotine uses the skew azimuth of the
//! central line at the centre, RSO the azimuth `gama0` of the central line at
//! the natural origin on the aposphere.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::ProjError;
use crate::proj::common::{
    check_latitude, check_longitude, conformal_to_geodetic, is_polar, lon_adjust, tsfn,
};
use crate::proj::params::Params;
use crate::proj::Projection;

/// Below this, |U| is treated as reaching 1 (90° from the central line).
const U_EPS: f64 = 1e-12;

/// Which azimuth rectifies the skewed (u, v) grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rectification {
    /// The skew azimuth of the central line at the projection centre.
    SkewAzimuth,
    /// The derived `gama0`, azimuth of the central line on the aposphere.
    Gama0,
}

pub struct ObliqueMercator {
    params: Params,
    e: f64,
    e2: f64,
    // Aposphere constants
    a_: f64,
    b_: f64,
    h_: f64,
    gama0: f64,
    sin_g0: f64,
    cos_g0: f64,
    lambda0: f64,
    uc: f64,
    // Rectification rotation
    sin_r: f64,
    cos_r: f64,
}

impl ObliqueMercator {
    /// Precompute the aposphere and rectification constants.
    ///
    /// `ref_latitude`/`ref_longitude` locate the projection centre,
    /// `skew_azimuth` is the central line's azimuth there and `k0` its scale.
    pub fn new(params: Params, rectification: Rectification) -> Result<Self, ProjError> {
        let latc = params.ref_latitude();
        let alphac = params.skew_azimuth();
        if is_polar(latc) {
            return Err(ProjError::InvalidParameter(
                "oblique mercator centre cannot be a pole".to_string(),
            ));
        }

        let ellipsoid = params.ellipsoid();
        let (e, e2) = (ellipsoid.e(), ellipsoid.e2());
        let (sin_c, cos_c) = latc.sin_cos();
        let w2 = 1.0 - e2 * sin_c * sin_c;

        let b_ = (1.0 + e2 * cos_c.powi(4) / (1.0 - e2)).sqrt();
        let a_ = ellipsoid.a() * b_ * params.k0() * (1.0 - e2).sqrt() / w2;
        let t0 = tsfn(latc, e);
        let d = b_ * (1.0 - e2).sqrt() / (cos_c * w2.sqrt());
        let d2 = (d * d).max(1.0);
        let sign = 1.0_f64.copysign(latc);
        let f = d + (d2 - 1.0).sqrt() * sign;
        let h_ = f * t0.powf(b_);
        let g = (f - 1.0 / f) / 2.0;

        let sin_alpha = alphac.sin();
        if sin_alpha.abs() > d * (1.0 + U_EPS) {
            return Err(ProjError::InvalidParameter(format!(
                "no central line with azimuth {:.6}° through latitude {:.6}°",
                alphac.to_degrees(),
                latc.to_degrees()
            )));
        }
        let gama0 = (sin_alpha / d).clamp(-1.0, 1.0).asin();

        let shift = g * gama0.tan();
        if !shift.is_finite() || shift.abs() > 1.0 + U_EPS {
            return Err(ProjError::InvalidParameter(format!(
                "central line azimuth {:.6}° is degenerate at latitude {:.6}°",
                alphac.to_degrees(),
                latc.to_degrees()
            )));
        }
        let lambda0 = params.ref_longitude() - shift.clamp(-1.0, 1.0).asin() / b_;

        let cos_alpha = alphac.cos();
        let uc = if cos_alpha.abs() < U_EPS {
            a_ * lon_adjust(params.ref_longitude() - lambda0)
        } else {
            (a_ / b_) * ((d2 - 1.0).sqrt() / cos_alpha).atan() * sign
        };

        let rectify = match rectification {
            Rectification::SkewAzimuth => alphac,
            Rectification::Gama0 => gama0,
        };
        let (sin_r, cos_r) = rectify.sin_cos();
        let (sin_g0, cos_g0) = gama0.sin_cos();

        Ok(Self {
            params,
            e,
            e2,
            a_,
            b_,
            h_,
            gama0,
            sin_g0,
            cos_g0,
            lambda0,
            uc,
            sin_r,
            cos_r,
        })
    }

    /// Azimuth of the central line at the natural origin, radians.
    pub fn gama0(&self) -> f64 {
        self.gama0
    }

    /// Longitude of the natural origin, where the central line crosses the
    /// aposphere's equator.
    pub fn lambda0(&self) -> f64 {
        self.lambda0
    }

    /// Rectify skewed (u, v) metres into grid (x, y) output units.
    pub fn deskew(&self, u: f64, v: f64) -> (f64, f64) {
        self.params.to_grid(
            v * self.cos_r + u * self.sin_r,
            u * self.cos_r - v * self.sin_r,
        )
    }

    /// Inverse of [`deskew`](Self::deskew).
    pub fn skew(&self, x: f64, y: f64) -> (f64, f64) {
        let (xm, ym) = self.params.from_grid(x, y);
        (
            ym * self.cos_r + xm * self.sin_r,
            xm * self.cos_r - ym * self.sin_r,
        )
    }

    /// Natural (u, v) with u measured from the natural origin, and BΔλ.
    fn natural(&self, lat: f64, lon: f64) -> Result<(f64, f64, f64), ProjError> {
        check_latitude(lat)?;
        check_longitude(lon)?;
        let (a_, b_) = (self.a_, self.b_);
        let bdl = b_ * lon_adjust(lon - self.lambda0);

        if is_polar(lat) {
            let lat = FRAC_PI_2.copysign(lat);
            let v = (a_ / b_) * (FRAC_PI_4 - lat.signum() * self.gama0 / 2.0).tan().ln();
            return Ok((a_ * lat / b_, v, bdl));
        }

        let q = self.h_ / tsfn(lat, self.e).powf(b_);
        let s = (q - 1.0 / q) / 2.0;
        let t = (q + 1.0 / q) / 2.0;
        let v_ = bdl.sin();
        let u_ = (-v_ * self.cos_g0 + s * self.sin_g0) / t;
        if (u_.abs() - 1.0).abs() < U_EPS {
            return Err(ProjError::OutOfDomain(format!(
                "({:.6}°, {:.6}°) lies 90° from the central line",
                lat.to_degrees(),
                lon.to_degrees()
            )));
        }

        let v = a_ * ((1.0 - u_) / (1.0 + u_)).ln() / (2.0 * b_);
        let u = a_ * (s * self.cos_g0 + v_ * self.sin_g0).atan2(bdl.cos()) / b_;
        Ok((u, v, bdl))
    }
}

impl Projection for ObliqueMercator {
    fn geo_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjError> {
        let (u, v, _) = self.natural(lat, lon)?;
        Ok(self.deskew(u - self.uc, v))
    }

    fn xy_geo(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let (a_, b_) = (self.a_, self.b_);
        let (u, v) = self.skew(x, y);
        let u = u + self.uc;

        let q = (-b_ * v / a_).exp();
        let s = (q - 1.0 / q) / 2.0;
        let t = (q + 1.0 / q) / 2.0;
        let v_ = (b_ * u / a_).sin();
        let u_ = (v_ * self.cos_g0 + s * self.sin_g0) / t;
        if (u_.abs() - 1.0).abs() < U_EPS {
            return Ok((FRAC_PI_2.copysign(u_), lon_adjust(self.lambda0)));
        }

        let t_ = (self.h_ / ((1.0 + u_) / (1.0 - u_)).sqrt()).powf(1.0 / b_);
        let chi = FRAC_PI_2 - 2.0 * t_.atan();
        let lat = conformal_to_geodetic(chi, self.e2);
        check_latitude(lat)?;
        let lon = self.lambda0 - (s * self.cos_g0 - v_ * self.sin_g0).atan2((b_ * u / a_).cos()) / b_;
        Ok((lat, lon_adjust(lon)))
    }

    fn k(&self, lat: f64, lon: f64) -> Result<f64, ProjError> {
        let (u, _, bdl) = self.natural(lat, lon)?;
        if is_polar(lat) {
            return Err(ProjError::OutOfDomain(
                "oblique mercator scale is not evaluated at the poles".to_string(),
            ));
        }
        let sin_lat = lat.sin();
        Ok(self.a_ * (self.b_ * u / self.a_).cos() * (1.0 - self.e2 * sin_lat * sin_lat).sqrt()
            / (self.ellipsoid().a() * lat.cos() * bdl.cos()))
    }

    fn params(&self) -> &Params {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::{CLARKE_1866, EVEREST_1967};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn dms(d: f64, m: f64, s: f64) -> f64 {
        (d + m / 60.0 + s / 3600.0).to_radians()
    }

    fn borneo(rectification: Rectification) -> ObliqueMercator {
        let params = Params::builder(EVEREST_1967)
            .ref_latitude(4.0_f64.to_radians())
            .ref_longitude(115.0_f64.to_radians())
            .skew_azimuth(dms(53.0, 18.0, 56.9537))
            .k0(0.99984)
            .false_east(590_476.87)
            .false_north(442_857.65)
            .build()
            .unwrap();
        ObliqueMercator::new(params, rectification).unwrap()
    }

    #[test]
    fn test_aposphere_constants() {
        let om = borneo(Rectification::Gama0);
        assert_abs_diff_eq!(om.b_, 1.003_303_209_2, epsilon = 1e-10);
        assert_abs_diff_eq!(om.a_, 6_376_278.686, epsilon = 1e-3);
        assert_abs_diff_eq!(om.h_, 1.000_002_991_3, epsilon = 1e-10);
        // 53°07'48.3685" published for the Borneo RSO
        assert_abs_diff_eq!(om.gama0(), dms(53.0, 7.0, 48.3685), epsilon = 1e-9);
        assert_abs_diff_eq!(om.lambda0(), 1.914_373_469_3, epsilon = 1e-10);
        assert_abs_diff_eq!(om.uc, 738_096.094, epsilon = 1e-3);
    }

    #[test]
    fn test_centre_maps_to_false_origin() {
        for r in [Rectification::Gama0, Rectification::SkewAzimuth] {
            let om = borneo(r);
            let (x, y) = om
                .geo_xy(4.0_f64.to_radians(), 115.0_f64.to_radians())
                .unwrap();
            assert_abs_diff_eq!(x, 590_476.87, epsilon = 1e-3);
            assert_abs_diff_eq!(y, 442_857.65, epsilon = 1e-3);
            let k = om.k(4.0_f64.to_radians(), 115.0_f64.to_radians()).unwrap();
            assert_relative_eq!(k, 0.99984, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_skew_deskew_inverse() {
        let om = borneo(Rectification::SkewAzimuth);
        let (x, y) = om.deskew(12_345.6, -7_890.1);
        let (u, v) = om.skew(x, y);
        assert_abs_diff_eq!(u, 12_345.6, epsilon = 1e-8);
        assert_abs_diff_eq!(v, -7_890.1, epsilon = 1e-8);
    }

    #[test]
    fn test_roundtrip_region() {
        for r in [Rectification::Gama0, Rectification::SkewAzimuth] {
            let om = borneo(r);
            for lat in [-10.0_f64, 0.0, 4.0, 5.0, 10.0, 40.0, 89.9] {
                for lon in [105.0_f64, 110.0, 115.0, 120.0, 125.0] {
                    let (lat, lon) = (lat.to_radians(), lon.to_radians());
                    let (x, y) = om.geo_xy(lat, lon).unwrap();
                    let (lat2, lon2) = om.xy_geo(x, y).unwrap();
                    assert_abs_diff_eq!(lat2, lat, epsilon = 1e-10);
                    assert_abs_diff_eq!(lon2, lon, epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_pole_roundtrip() {
        let om = borneo(Rectification::Gama0);
        let (x, y) = om.geo_xy(FRAC_PI_2, 115.0_f64.to_radians()).unwrap();
        let (lat, lon) = om.xy_geo(x, y).unwrap();
        assert_abs_diff_eq!(lat, FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(lon, om.lambda0(), epsilon = 1e-12);
    }

    #[test]
    fn test_high_latitude_centre() {
        // Alaska zone 1 style: centre 57°N, azimuth atan(-3/4)
        let params = Params::builder(CLARKE_1866)
            .ref_latitude(57.0_f64.to_radians())
            .ref_longitude((-133.666_666_67_f64).to_radians())
            .skew_azimuth((-0.75_f64).atan())
            .k0(0.9999)
            .false_east(5_000_000.0)
            .false_north(-5_000_000.0)
            .build()
            .unwrap();
        let om = ObliqueMercator::new(params, Rectification::SkewAzimuth).unwrap();
        for lat in [50.0_f64, 55.0, 57.0, 60.0, 65.0] {
            for lon in [-140.0_f64, -135.0, -130.0] {
                let (lat, lon) = (lat.to_radians(), lon.to_radians());
                let (x, y) = om.geo_xy(lat, lon).unwrap();
                let (lat2, lon2) = om.xy_geo(x, y).unwrap();
                assert_abs_diff_eq!(lat2, lat, epsilon = 1e-10);
                assert_abs_diff_eq!(lon2, lon, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_polar_centre_rejected() {
        let params = Params::builder(EVEREST_1967)
            .ref_latitude(FRAC_PI_2)
            .skew_azimuth(0.5)
            .build()
            .unwrap();
        assert!(matches!(
            ObliqueMercator::new(params, Rectification::Gama0),
            Err(ProjError::InvalidParameter(_))
        ));
    }
}

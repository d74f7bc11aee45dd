//! American Polyconic projection (ellipsoidal, Snyder 18-1 .. 18-17).
//!
//! Every parallel is a true-scale circular arc; the central meridian is
//! straight and true to scale. The circles of neighbouring parallels are
//! nested, so the inverse brackets the latitude whose circle passes through
//! the point and refines it with safeguarded Newton steps on Snyder 18-17.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::ProjError;
use crate::proj::common::{
    check_latitude, check_longitude, is_polar, lon_adjust, meridional_arc, meridional_arc_prime,
};
use crate::proj::params::Params;
use crate::proj::Projection;

/// Maximum iterations for the inverse latitude.
const INV_MAX_ITER: usize = 32;
/// Convergence threshold on the inverse latitude update (radians, relative
/// below one radian).
const INV_TOL: f64 = 1e-13;
/// Below this |φ| the equatorial limit formulas apply.
const EQUATOR_EPS: f64 = 1e-10;
/// Slack on the half-turn longitude bound of the inverse.
const LON_EPS: f64 = 1e-12;

pub struct Polyconic {
    params: Params,
    e2: f64,
    m0: f64,
}

impl Polyconic {
    pub fn new(params: Params) -> Self {
        Self {
            e2: params.ellipsoid().e2(),
            m0: meridional_arc(params.ellipsoid(), params.ref_latitude()),
            params,
        }
    }

    /// Scale factor along the meridian at (lat, lon).
    ///
    /// The scale along every parallel is exactly `k0`; this is the other
    /// principal direction, which grows with distance from the central
    /// meridian.
    pub fn h(&self, lat: f64, lon: f64) -> Result<f64, ProjError> {
        check_latitude(lat)?;
        check_longitude(lon)?;
        let k0 = self.params.k0();
        let e2 = self.e2;
        let dlam = lon_adjust(lon - self.params.ref_longitude());
        if lat.abs() < EQUATOR_EPS {
            return Ok(k0 * (1.0 + dlam * dlam / (2.0 * (1.0 - e2))));
        }
        if is_polar(lat) {
            return Ok(k0);
        }

        let (sin_lat, cos_lat) = lat.sin_cos();
        let w2 = 1.0 - e2 * sin_lat * sin_lat;
        let e = dlam * sin_lat;
        let d = ((e - e.sin()) / (1.0 / (cos_lat * cos_lat) - e.cos() - e2 * sin_lat * sin_lat / w2))
            .atan();
        let half = (e / 2.0).sin();
        let tan_lat = lat.tan();
        Ok(k0 * (1.0 - e2 + 2.0 * w2 * half * half / (tan_lat * tan_lat))
            / ((1.0 - e2) * d.cos()))
    }

    /// Snyder's C = sqrt(1 - e² sin²φ)·tanφ, the reciprocal of the parallel's
    /// radius over `a`.
    fn c(&self, phi: f64) -> f64 {
        let s = phi.sin();
        (1.0 - self.e2 * s * s).sqrt() * phi.tan()
    }

    /// dC/dφ.
    fn c_prime(&self, phi: f64) -> f64 {
        let (s, c) = phi.sin_cos();
        let w = (1.0 - self.e2 * s * s).sqrt();
        w / (c * c) - self.e2 * s * s / w
    }

    /// Northern latitude in (0, π/2] whose parallel circle passes through the
    /// point with normalised northing `a_ > 0` and easting `xn`.
    ///
    /// `g` is negative while the point lies inside the circle of φ, so the
    /// root stays bracketed; Newton steps that leave the bracket are replaced
    /// by bisection.
    fn solve_latitude(&self, a_: f64, xn: f64, max_iter: usize) -> Result<f64, ProjError> {
        let ellipsoid = self.ellipsoid();
        let a = ellipsoid.a();
        let (mut lo, mut hi) = (0.0, FRAC_PI_2);
        let mut phi = if a_ < hi { a_ } else { 0.5 * hi };
        for _ in 0..max_iter {
            let c = self.c(phi);
            let ma = meridional_arc(ellipsoid, phi) / a;
            let mp = meridional_arc_prime(ellipsoid, phi) / a;
            let d = a_ - ma;
            let r2 = xn * xn + d * d;
            let g = c * r2 - 2.0 * d;
            let dg = self.c_prime(phi) * r2 - 2.0 * c * d * mp + 2.0 * mp;
            if g < 0.0 {
                lo = phi;
            } else {
                hi = phi;
            }

            let step = g / dg;
            if step.abs() <= INV_TOL * phi.min(1.0) {
                return Ok((phi - step).min(FRAC_PI_2));
            }
            let next = phi - step;
            phi = if next > lo && next < hi {
                next
            } else {
                0.5 * (lo + hi)
            };
        }
        Err(ProjError::NoConvergence(format!(
            "polyconic inverse latitude (A={a_:.6}, x/a={xn:.6})"
        )))
    }
}

impl Projection for Polyconic {
    fn geo_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjError> {
        check_latitude(lat)?;
        check_longitude(lon)?;
        let k0 = self.params.k0();
        let a = self.ellipsoid().a();
        let dlam = lon_adjust(lon - self.params.ref_longitude());

        let (x, y) = if lat.abs() < EQUATOR_EPS {
            (a * dlam, -self.m0)
        } else {
            let sin_lat = lat.sin();
            let n = a / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
            let e = dlam * sin_lat;
            let cot = 1.0 / lat.tan();
            // 1 - cos E, without the cancellation for small E
            let half = (e / 2.0).sin();
            (
                n * cot * e.sin(),
                meridional_arc(self.ellipsoid(), lat) - self.m0 + 2.0 * n * cot * half * half,
            )
        };
        Ok(self.params.to_grid(k0 * x, k0 * y))
    }

    fn xy_geo(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::OutOfDomain(format!("({x}, {y})")));
        }
        let k0 = self.params.k0();
        let lon0 = self.params.ref_longitude();
        let a = self.ellipsoid().a();
        let (xm, ym) = self.params.from_grid(x, y);
        let a_ = (self.m0 + ym / k0) / a;
        let xn = xm / k0 / a;
        let outside = || {
            ProjError::OutOfDomain(format!(
                "({x:.3}, {y:.3}) lies outside the polyconic sheet"
            ))
        };

        if a_.abs() < EQUATOR_EPS {
            if xn.abs() > PI * (1.0 + LON_EPS) {
                return Err(outside());
            }
            return Ok((0.0, lon_adjust(xn + lon0)));
        }

        // The southern half mirrors the northern one across the equator.
        let phi = self.solve_latitude(a_.abs(), xn, INV_MAX_ITER)?;
        let lat = phi.copysign(a_);
        if is_polar(phi) {
            return Ok((lat, lon_adjust(lon0)));
        }

        let c = self.c(phi);
        let d = a_.abs() - meridional_arc(self.ellipsoid(), phi) / a;
        let e = (xn * c).atan2(1.0 - d * c);
        let dlam = e / phi.sin();
        if dlam.abs() > PI * (1.0 + LON_EPS) {
            return Err(outside());
        }
        Ok((lat, lon_adjust(dlam + lon0)))
    }

    fn k(&self, lat: f64, _lon: f64) -> Result<f64, ProjError> {
        check_latitude(lat)?;
        Ok(self.params.k0())
    }

    fn params(&self) -> &Params {
        &self.params
    }
}

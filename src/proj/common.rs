//! Common helpers for projection math (meridional arc, latitude conversions, etc.).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use super::ellipsoid::Ellipsoid;
use crate::error::ProjError;

/// Maximum Newton steps for the footpoint latitude.
const FOOTPOINT_MAX_ITER: usize = 16;
/// Convergence threshold on the footpoint latitude update (radians).
const FOOTPOINT_TOL: f64 = 1e-14;
/// Slack allowed past ±90° before a latitude is rejected.
const LAT_EPS: f64 = 1e-12;

/// Series coefficients of the meridional arc in powers of n (third flattening).
fn arc_coefficients(ellipsoid: &Ellipsoid) -> (f64, [f64; 4]) {
    let n = ellipsoid.n();
    let n2 = n * n;
    let n3 = n2 * n;
    let n4 = n3 * n;

    let a = ellipsoid.a() / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0);
    let a2 = -3.0 / 2.0 * n + 9.0 / 16.0 * n3;
    let a4 = 15.0 / 16.0 * n2 - 15.0 / 32.0 * n4;
    let a6 = -35.0 / 48.0 * n3;
    let a8 = 315.0 / 512.0 * n4;
    (a, [a2, a4, a6, a8])
}

/// Compute the meridional arc length from the equator to latitude phi.
/// Uses the series expansion in powers of n (third flattening).
pub fn meridional_arc(ellipsoid: &Ellipsoid, phi: f64) -> f64 {
    let (a, [a2, a4, a6, a8]) = arc_coefficients(ellipsoid);
    a * (phi
        + a2 * (2.0 * phi).sin()
        + a4 * (4.0 * phi).sin()
        + a6 * (6.0 * phi).sin()
        + a8 * (8.0 * phi).sin())
}

/// Derivative dM/dφ of [`meridional_arc`], term by term.
pub fn meridional_arc_prime(ellipsoid: &Ellipsoid, phi: f64) -> f64 {
    let (a, [a2, a4, a6, a8]) = arc_coefficients(ellipsoid);
    a * (1.0
        + 2.0 * a2 * (2.0 * phi).cos()
        + 4.0 * a4 * (4.0 * phi).cos()
        + 6.0 * a6 * (6.0 * phi).cos()
        + 8.0 * a8 * (8.0 * phi).cos())
}

/// Footpoint latitude: the φ whose meridional arc equals `m`.
///
/// Newton iteration on [`meridional_arc`]. Arcs longer than the quarter
/// meridian have no footpoint and are reported as out of domain.
pub fn footpoint_latitude(ellipsoid: &Ellipsoid, m: f64) -> Result<f64, ProjError> {
    footpoint_within(ellipsoid, m, FOOTPOINT_MAX_ITER)
}

fn footpoint_within(ellipsoid: &Ellipsoid, m: f64, max_iter: usize) -> Result<f64, ProjError> {
    let quarter = meridional_arc(ellipsoid, FRAC_PI_2);
    if !m.is_finite() || m.abs() > quarter * (1.0 + 1e-12) {
        return Err(ProjError::OutOfDomain(format!(
            "meridional distance {m:.3} m beyond the pole"
        )));
    }

    let mut phi = m / ellipsoid.a();
    for _ in 0..max_iter {
        let step = (meridional_arc(ellipsoid, phi) - m) / meridional_arc_prime(ellipsoid, phi);
        phi -= step;
        if step.abs() < FOOTPOINT_TOL {
            return Ok(phi.clamp(-FRAC_PI_2, FRAC_PI_2));
        }
    }
    Err(ProjError::NoConvergence(format!(
        "footpoint latitude for meridional distance {m:.3} m"
    )))
}

/// Normalise a longitude (difference) into (-π, π].
pub fn lon_adjust(lon: f64) -> f64 {
    let mut l = lon % TAU;
    if l > PI {
        l -= TAU;
    } else if l <= -PI {
        l += TAU;
    }
    l
}

/// Reject latitudes beyond the poles.
pub fn check_latitude(lat: f64) -> Result<(), ProjError> {
    if lat.is_finite() && lat.abs() <= FRAC_PI_2 + LAT_EPS {
        Ok(())
    } else {
        Err(ProjError::OutOfDomain(format!("latitude {lat} rad")))
    }
}

/// Reject non-finite longitudes, which `lon_adjust` would pass through as NaN.
pub fn check_longitude(lon: f64) -> Result<(), ProjError> {
    if lon.is_finite() {
        Ok(())
    } else {
        Err(ProjError::OutOfDomain(format!("longitude {lon} rad")))
    }
}

/// True when `lat` sits on a pole within floating-point slack.
pub fn is_polar(lat: f64) -> bool {
    (lat.abs() - FRAC_PI_2).abs() < 1e-10
}

/// Snyder's t(φ): tan(π/4 - φ/2) / ((1 - e sinφ)/(1 + e sinφ))^(e/2).
pub fn tsfn(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

/// Geodetic latitude from conformal latitude χ (Snyder 3-5, e⁸ series).
pub fn conformal_to_geodetic(chi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let e8 = e6 * e2;
    chi + (2.0 * chi).sin() * (e2 / 2.0 + 5.0 * e4 / 24.0 + e6 / 12.0 + 13.0 * e8 / 360.0)
        + (4.0 * chi).sin() * (7.0 * e4 / 48.0 + 29.0 * e6 / 240.0 + 811.0 * e8 / 11520.0)
        + (6.0 * chi).sin() * (7.0 * e6 / 120.0 + 81.0 * e8 / 1120.0)
        + (8.0 * chi).sin() * (4279.0 * e8 / 161280.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::{CLARKE_1866, WGS84};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_meridional_arc_equator() {
        let m = meridional_arc(&WGS84, 0.0);
        assert_relative_eq!(m, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_meridional_arc_positive() {
        let m = meridional_arc(&WGS84, std::f64::consts::FRAC_PI_4);
        // Arc to 45 degrees should be ~4984944m (approx)
        assert!(m > 4_900_000.0 && m < 5_100_000.0);
    }

    #[test]
    fn test_quarter_meridian_wgs84() {
        assert_abs_diff_eq!(meridional_arc(&WGS84, FRAC_PI_2), 10_001_965.729, epsilon = 0.01);
    }

    #[test]
    fn test_arc_prime_is_meridian_radius() {
        for deg in [0.0_f64, 20.0, 45.0, 70.0, 89.0] {
            let phi = deg.to_radians();
            assert_relative_eq!(
                meridional_arc_prime(&CLARKE_1866, phi),
                CLARKE_1866.meridian_radius(phi),
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_footpoint_inverts_arc() {
        for deg in [-89.5_f64, -45.0, 0.0, 12.5, 40.5, 80.0] {
            let phi = deg.to_radians();
            let m = meridional_arc(&CLARKE_1866, phi);
            assert_abs_diff_eq!(footpoint_latitude(&CLARKE_1866, m).unwrap(), phi, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_footpoint_beyond_pole() {
        let m = meridional_arc(&WGS84, FRAC_PI_2) + 1000.0;
        assert!(matches!(
            footpoint_latitude(&WGS84, m),
            Err(ProjError::OutOfDomain(_))
        ));
    }

    #[test]
    fn test_footpoint_reports_exhausted_iterations() {
        let m = meridional_arc(&CLARKE_1866, 0.9);
        assert!(matches!(
            footpoint_within(&CLARKE_1866, m, 1),
            Err(ProjError::NoConvergence(_))
        ));
        assert!(footpoint_within(&CLARKE_1866, m, FOOTPOINT_MAX_ITER).is_ok());
    }

    #[test]
    fn test_check_longitude() {
        assert!(check_longitude(-3.0).is_ok());
        assert!(check_longitude(100.0).is_ok());
        assert!(matches!(check_longitude(f64::NAN), Err(ProjError::OutOfDomain(_))));
        assert!(check_longitude(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_lon_adjust() {
        assert_relative_eq!(lon_adjust(0.5), 0.5);
        assert_relative_eq!(lon_adjust(PI), PI);
        assert_relative_eq!(lon_adjust(-PI), PI);
        assert_relative_eq!(lon_adjust(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-15);
        assert_relative_eq!(lon_adjust(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-15);
        assert_relative_eq!(lon_adjust(0.25 + 4.0 * TAU), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_conformal_roundtrip() {
        // χ = 2·atan(1/t) - π/2 inverts back through the series
        let e = WGS84.e();
        for deg in [-80.0_f64, -30.0, 0.0, 15.0, 60.0, 85.0] {
            let phi = deg.to_radians();
            let chi = FRAC_PI_2 - 2.0 * tsfn(phi, e).atan();
            assert_abs_diff_eq!(conformal_to_geodetic(chi, WGS84.e2()), phi, epsilon = 1e-11);
        }
    }
}

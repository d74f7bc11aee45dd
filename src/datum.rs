//! Seven-parameter Helmert datum transformation.
//!
//! Rotations use the small-angle (linearised) matrix in the coordinate-frame
//! convention:
//!
//! ```text
//! x' = dx + (1+k)·( x + rz·y - ry·z)
//! y' = dy + (1+k)·(-rz·x +  y + rx·z)
//! z' = dz + (1+k)·( ry·x - rx·y +  z)
//! ```
//!
//! Parameters in the position-vector convention are the same with the three
//! rotations negated.

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;

/// Radians per arc second.
const ARCSEC: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Helmert parameters: translations in metres, rotations in radians,
/// scale as a dimensionless difference applied as `1 + k`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DatumTransformation {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub drx: f64,
    pub dry: f64,
    pub drz: f64,
    pub k: f64,
}

impl DatumTransformation {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);

    pub const fn new(dx: f64, dy: f64, dz: f64, drx: f64, dry: f64, drz: f64, k: f64) -> Self {
        Self {
            dx,
            dy,
            dz,
            drx,
            dry,
            drz,
            k,
        }
    }

    /// Pure translation (three-parameter shift).
    pub const fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(dx, dy, dz, 0.0, 0.0, 0.0, 0.0)
    }

    /// Build from the units parameters are usually published in:
    /// rotations in arc seconds, scale in parts per million.
    pub fn from_published(
        dx: f64,
        dy: f64,
        dz: f64,
        rx_arcsec: f64,
        ry_arcsec: f64,
        rz_arcsec: f64,
        ppm: f64,
    ) -> Self {
        Self::new(
            dx,
            dy,
            dz,
            rx_arcsec * ARCSEC,
            ry_arcsec * ARCSEC,
            rz_arcsec * ARCSEC,
            ppm * 1e-6,
        )
    }

    /// Apply the transformation to one ECEF point.
    pub fn transform(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let s = 1.0 + self.k;
        (
            self.dx + s * (x + self.drz * y - self.dry * z),
            self.dy + s * (-self.drz * x + y + self.drx * z),
            self.dz + s * (self.dry * x - self.drx * y + z),
        )
    }

    /// Apply the transformation to ECEF points in place.
    pub fn transform_batch(&self, points: &mut [(f64, f64, f64)]) {
        for p in points.iter_mut() {
            *p = self.transform(p.0, p.1, p.2);
        }
    }

    /// Geographic (lat, lon, h) on `from` -> geographic on `to`, through ECEF.
    ///
    /// Angles in radians, heights in metres above the respective ellipsoid.
    /// Fails only if the geodetic-from-ECEF iteration on `to` does not
    /// converge.
    pub fn transform_geo(
        &self,
        from: &Ellipsoid,
        to: &Ellipsoid,
        lat: f64,
        lon: f64,
        h: f64,
    ) -> Result<(f64, f64, f64), ProjError> {
        let (x, y, z) = from.geo_ecef(lat, lon, h);
        let (x, y, z) = self.transform(x, y, z);
        to.ecef_geo(x, y, z)
    }

    /// First-order inverse: every parameter negated.
    ///
    /// This is not the exact inverse of [`transform`](Self::transform). The
    /// neglected terms are products of two parameters, under a millimetre for
    /// rotations of a few arc seconds and scales of a few ppm.
    pub fn inverse(&self) -> Self {
        Self::new(-self.dx, -self.dy, -self.dz, -self.drx, -self.dry, -self.drz, -self.k)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

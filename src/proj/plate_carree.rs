//! Plate Carrée (equirectangular) projection.
//!
//! forward: x = k₀·a·(λ - λ₀)·cos(φ₀), y = k₀·a·φ
//! inverse: λ = λ₀ + x/(k₀·a·cos(φ₀)), φ = y/(k₀·a)

use crate::error::ProjError;
use crate::proj::common::{check_latitude, check_longitude, is_polar, lon_adjust};
use crate::proj::params::Params;
use crate::proj::Projection;

pub struct PlateCarree {
    params: Params,
    cos_lat0: f64,
    scale: f64, // k0 * a
}

impl PlateCarree {
    pub fn new(params: Params) -> Result<Self, ProjError> {
        if is_polar(params.ref_latitude()) {
            return Err(ProjError::InvalidParameter(
                "plate carrée standard parallel cannot be a pole".to_string(),
            ));
        }
        Ok(Self {
            cos_lat0: params.ref_latitude().cos(),
            scale: params.k0() * params.ellipsoid().a(),
            params,
        })
    }
}

impl Projection for PlateCarree {
    fn geo_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjError> {
        check_latitude(lat)?;
        check_longitude(lon)?;
        let dlam = lon_adjust(lon - self.params.ref_longitude());
        Ok(self
            .params
            .to_grid(self.scale * dlam * self.cos_lat0, self.scale * lat))
    }

    fn xy_geo(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let (xm, ym) = self.params.from_grid(x, y);
        let lat = ym / self.scale;
        check_latitude(lat)?;
        let lon = self.params.ref_longitude() + xm / (self.scale * self.cos_lat0);
        Ok((lat, lon_adjust(lon)))
    }

    fn k(&self, lat: f64, _lon: f64) -> Result<f64, ProjError> {
        check_latitude(lat)?;
        if is_polar(lat) {
            return Err(ProjError::OutOfDomain(
                "plate carrée scale is infinite at the poles".to_string(),
            ));
        }
        Ok(self.params.k0() * self.cos_lat0 / lat.cos())
    }

    fn params(&self) -> &Params {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn plain() -> PlateCarree {
        PlateCarree::new(Params::default()).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let proj = plain();
        let lon = 10.0_f64.to_radians();
        let lat = 45.0_f64.to_radians();
        let (x, y) = proj.geo_xy(lat, lon).unwrap();
        let (lat2, lon2) = proj.xy_geo(x, y).unwrap();
        assert_relative_eq!(lon2, lon, epsilon = 1e-12);
        assert_relative_eq!(lat2, lat, epsilon = 1e-12);
    }

    #[test]
    fn test_origin() {
        let (x, y) = plain().geo_xy(0.0, 0.0).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_with_standard_parallel() {
        // With standard parallel at 30°, x should be scaled by cos(30°)
        let lat_ts = 30.0_f64.to_radians();
        let params = Params::builder(WGS84).ref_latitude(lat_ts).build().unwrap();
        let proj = PlateCarree::new(params).unwrap();
        let lon = 1.0_f64.to_radians();
        let (x, y) = proj.geo_xy(0.2, lon).unwrap();
        assert_relative_eq!(x, WGS84.a() * lon * lat_ts.cos(), epsilon = 1e-6);
        // latitude is not offset by the standard parallel
        assert_relative_eq!(y, WGS84.a() * 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_dateline() {
        let proj = plain();
        let (xe, _) = proj.geo_xy(0.0, PI - 1e-9).unwrap();
        let (xw, _) = proj.geo_xy(0.0, -PI + 1e-9).unwrap();
        assert_relative_eq!(xe, -xw, epsilon = 1e-3);
    }

    #[test]
    fn test_scale_factor() {
        let lat0 = 30.0_f64.to_radians();
        let params = Params::builder(WGS84).ref_latitude(lat0).build().unwrap();
        let proj = PlateCarree::new(params).unwrap();
        assert_relative_eq!(proj.k(lat0, 0.0).unwrap(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(
            proj.k(60.0_f64.to_radians(), 1.0).unwrap(),
            lat0.cos() / 60.0_f64.to_radians().cos(),
            epsilon = 1e-15
        );
        assert!(matches!(proj.k(FRAC_PI_2, 0.0), Err(ProjError::OutOfDomain(_))));
    }

    #[test]
    fn test_polar_standard_parallel_rejected() {
        let params = Params::builder(WGS84).ref_latitude(FRAC_PI_2).build().unwrap();
        assert!(matches!(
            PlateCarree::new(params),
            Err(ProjError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_northing_past_pole_rejected() {
        let proj = plain();
        assert!(matches!(
            proj.xy_geo(0.0, WGS84.a() * 1.6),
            Err(ProjError::OutOfDomain(_))
        ));
    }
}

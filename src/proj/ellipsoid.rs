//! Reference ellipsoids and geodetic <-> ECEF conversions.

use std::f64::consts::FRAC_PI_2;

use crate::error::ProjError;

/// Maximum number of latitude refinements in [`Ellipsoid::ecef_geo`].
const ECEF_MAX_ITER: usize = 16;
/// Convergence threshold on the latitude update (radians).
const ECEF_TOL: f64 = 1e-14;

/// Reference ellipsoid parameters.
///
/// The defining pair is (`a`, `f`); everything else is derived once at
/// construction. Values are immutable and cheap to copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    name: &'static str,
    /// Semi-major axis (metres)
    a: f64,
    /// Flattening (dimensionless)
    f: f64,
    /// Semi-minor axis: a * (1 - f)
    b: f64,
    /// First eccentricity squared: f * (2 - f)
    e2: f64,
    /// Second eccentricity squared: e^2 / (1 - e^2)
    ep2: f64,
    /// Third flattening: f / (2 - f)
    n: f64,
}

impl Ellipsoid {
    /// Free-form ellipsoid from semi-major axis and flattening.
    ///
    /// No validation happens here: `a > 0` and `0 <= f < 1` are
    /// preconditions. Use [`Ellipsoid::try_new`] for untrusted input.
    pub const fn new(a: f64, f: f64) -> Self {
        Self::with_name("user defined", a, f)
    }

    pub const fn with_name(name: &'static str, a: f64, f: f64) -> Self {
        let b = a * (1.0 - f);
        let e2 = f * (2.0 - f);
        let ep2 = e2 / (1.0 - e2);
        let n = f / (2.0 - f);
        Self {
            name,
            a,
            f,
            b,
            e2,
            ep2,
            n,
        }
    }

    /// Validated free-form constructor.
    pub fn try_new(a: f64, f: f64) -> Result<Self, ProjError> {
        if !a.is_finite() || a <= 0.0 {
            return Err(ProjError::InvalidParameter(format!(
                "semi-major axis must be positive, got {a}"
            )));
        }
        if !f.is_finite() || !(0.0..1.0).contains(&f) {
            return Err(ProjError::InvalidParameter(format!(
                "flattening must be in [0, 1), got {f}"
            )));
        }
        Ok(Self::new(a, f))
    }

    /// Look up a catalogue ellipsoid by name (see [`StandardEllipsoid::from_name`]).
    pub fn named(name: &str) -> Result<Self, ProjError> {
        StandardEllipsoid::from_name(name)
            .map(StandardEllipsoid::ellipsoid)
            .ok_or_else(|| ProjError::UnknownEllipsoid(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn f(&self) -> f64 {
        self.f
    }

    /// First eccentricity (computed at runtime, `sqrt` is not const).
    pub fn e(&self) -> f64 {
        self.e2.sqrt()
    }

    pub fn e2(&self) -> f64 {
        self.e2
    }

    pub fn ep2(&self) -> f64 {
        self.ep2
    }

    pub fn n(&self) -> f64 {
        self.n
    }

    /// Radius of curvature in the prime vertical, N(φ).
    pub fn prime_vertical_radius(&self, lat: f64) -> f64 {
        let s = lat.sin();
        self.a / (1.0 - self.e2 * s * s).sqrt()
    }

    /// Radius of curvature in the meridian, ρ(φ).
    pub fn meridian_radius(&self, lat: f64) -> f64 {
        let s = lat.sin();
        let w2 = 1.0 - self.e2 * s * s;
        self.a * (1.0 - self.e2) / (w2 * w2.sqrt())
    }

    /// Authalic auxiliary q(φ) (Snyder 3-12).
    ///
    /// q = (1 - e²)·[sinφ / (1 - e² sin²φ) + atanh(e sinφ) / e]
    pub fn q(&self, lat: f64) -> f64 {
        let s = lat.sin();
        if self.e2 < 1e-20 {
            return 2.0 * s;
        }
        let e = self.e();
        (1.0 - self.e2) * (s / (1.0 - self.e2 * s * s) + (e * s).atanh() / e)
    }

    /// q at the pole.
    pub fn qp(&self) -> f64 {
        self.q(FRAC_PI_2)
    }

    /// Authalic latitude β = asin(q(φ) / q(π/2)).
    pub fn beta(&self, lat: f64) -> f64 {
        (self.q(lat) / self.qp()).clamp(-1.0, 1.0).asin()
    }

    /// Geodetic (lat, lon, h) to Earth-centred Earth-fixed (x, y, z).
    pub fn geo_ecef(&self, lat: f64, lon: f64, h: f64) -> (f64, f64, f64) {
        let n = self.prime_vertical_radius(lat);
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        let x = (n + h) * cos_lat * cos_lon;
        let y = (n + h) * cos_lat * sin_lon;
        let z = (n * (1.0 - self.e2) + h) * sin_lat;
        (x, y, z)
    }

    /// ECEF (x, y, z) to geodetic (lat, lon, h).
    ///
    /// Fixed-point iteration on latitude, starting from the geocentric-to-
    /// geodetic first guess; the height uses the form
    /// `h = p cosφ + z sinφ - a √(1 - e² sin²φ)`, which stays well conditioned
    /// at the poles. Converges in three or four steps for terrestrial heights.
    pub fn ecef_geo(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64), ProjError> {
        let lon = y.atan2(x);
        let p = x.hypot(y);

        // Closer than a picometre to the polar axis: force the pole.
        if p < 1.0e-12 {
            let lat = FRAC_PI_2.copysign(z);
            return Ok((lat, lon, z.abs() - self.b));
        }

        let mut lat = z.atan2(p * (1.0 - self.e2));
        for _ in 0..ECEF_MAX_ITER {
            let n = self.prime_vertical_radius(lat);
            let h = self.height_above(p, z, lat);
            let next = z.atan2(p * (1.0 - self.e2 * n / (n + h)));
            let step = (next - lat).abs();
            lat = next;
            if step < ECEF_TOL {
                return Ok((lat, lon, self.height_above(p, z, lat)));
            }
        }
        Err(ProjError::NoConvergence(format!(
            "geodetic latitude from ECEF ({x}, {y}, {z})"
        )))
    }

    fn height_above(&self, p: f64, z: f64, lat: f64) -> f64 {
        let (s, c) = lat.sin_cos();
        p * c + z * s - self.a * (1.0 - self.e2 * s * s).sqrt()
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        WGS84
    }
}

pub const WGS84: Ellipsoid = Ellipsoid::with_name("WGS84", 6_378_137.0, 1.0 / 298.257_223_563);
pub const GRS80: Ellipsoid = Ellipsoid::with_name("GRS80", 6_378_137.0, 1.0 / 298.257_222_101);
pub const WGS72: Ellipsoid = Ellipsoid::with_name("WGS72", 6_378_135.0, 1.0 / 298.26);
pub const CLARKE_1866: Ellipsoid =
    Ellipsoid::with_name("Clarke 1866", 6_378_206.4, 1.0 / 294.978_698);
pub const CLARKE_1880: Ellipsoid =
    Ellipsoid::with_name("Clarke 1880", 6_378_249.145, 1.0 / 293.465);
pub const INTERNATIONAL: Ellipsoid =
    Ellipsoid::with_name("International 1924", 6_378_388.0, 1.0 / 297.0);
pub const BESSEL_1841: Ellipsoid =
    Ellipsoid::with_name("Bessel 1841", 6_377_397.155, 1.0 / 299.152_812_8);
pub const AIRY_1830: Ellipsoid =
    Ellipsoid::with_name("Airy 1830", 6_377_563.396, 1.0 / 299.324_964_6);
pub const KRASSOVSKY: Ellipsoid =
    Ellipsoid::with_name("Krassovsky 1940", 6_378_245.0, 1.0 / 298.3);
pub const EVEREST_1830: Ellipsoid =
    Ellipsoid::with_name("Everest 1830", 6_377_276.345, 1.0 / 300.8017);
/// Everest 1830 (1967 definition), used in Malaysia and Brunei.
pub const EVEREST_1967: Ellipsoid =
    Ellipsoid::with_name("Everest 1967", 6_377_298.556, 1.0 / 300.8017);

/// Named standard ellipsoids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StandardEllipsoid {
    Wgs84,
    Grs80,
    Wgs72,
    Clarke1866,
    Clarke1880,
    International,
    Bessel1841,
    Airy1830,
    Krassovsky,
    Everest1830,
    Everest1967,
}

impl StandardEllipsoid {
    pub const ALL: [StandardEllipsoid; 11] = [
        Self::Wgs84,
        Self::Grs80,
        Self::Wgs72,
        Self::Clarke1866,
        Self::Clarke1880,
        Self::International,
        Self::Bessel1841,
        Self::Airy1830,
        Self::Krassovsky,
        Self::Everest1830,
        Self::Everest1967,
    ];

    /// Parse from a name. Case, spaces, dashes and underscores are ignored.
    pub fn from_name(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "wgs84" => Some(Self::Wgs84),
            "grs80" => Some(Self::Grs80),
            "wgs72" => Some(Self::Wgs72),
            "clarke1866" | "clrk66" => Some(Self::Clarke1866),
            "clarke1880" | "clrk80" => Some(Self::Clarke1880),
            "international" | "international1924" | "intl" | "hayford" => {
                Some(Self::International)
            }
            "bessel" | "bessel1841" => Some(Self::Bessel1841),
            "airy" | "airy1830" => Some(Self::Airy1830),
            "krassovsky" | "krassowsky" | "krass" => Some(Self::Krassovsky),
            "everest" | "everest1830" | "evrst30" => Some(Self::Everest1830),
            "everest1967" | "evrstss" => Some(Self::Everest1967),
            _ => None,
        }
    }

    pub fn ellipsoid(self) -> Ellipsoid {
        match self {
            Self::Wgs84 => WGS84,
            Self::Grs80 => GRS80,
            Self::Wgs72 => WGS72,
            Self::Clarke1866 => CLARKE_1866,
            Self::Clarke1880 => CLARKE_1880,
            Self::International => INTERNATIONAL,
            Self::Bessel1841 => BESSEL_1841,
            Self::Airy1830 => AIRY_1830,
            Self::Krassovsky => KRASSOVSKY,
            Self::Everest1830 => EVEREST_1830,
            Self::Everest1967 => EVEREST_1967,
        }
    }
}

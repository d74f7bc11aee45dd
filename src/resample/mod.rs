//! Interpolation kernels for node-registered grids.
//!
//! Fractional coordinates are measured in node units: node `(col, row)` sits
//! at exactly `(col as f64, row as f64)`, so a grid of `nc × nr` nodes covers
//! `[0, nc-1] × [0, nr-1]` inclusive.

pub mod bilinear;
pub mod nearest;

/// Available interpolation methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpolationMethod {
    Nearest,
    #[default]
    Bilinear,
}

impl InterpolationMethod {
    /// Parse from a string name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Some(Self::Nearest),
            "bilinear" | "linear" => Some(Self::Bilinear),
            _ => None,
        }
    }

    /// Sample `src` at fractional node coordinates with this method.
    pub fn sample(
        &self,
        src: &ndarray::ArrayView2<'_, f32>,
        x: f64,
        y: f64,
        nodata: Option<f32>,
    ) -> Option<f32> {
        match self {
            Self::Nearest => nearest::sample(src, x, y, nodata),
            Self::Bilinear => bilinear::sample(src, x, y, nodata),
        }
    }
}

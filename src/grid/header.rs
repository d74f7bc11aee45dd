//! Fixed 128-byte header record of a correction grid file.
//!
//! All numbers are little-endian:
//!
//! | offset | size | field |
//! |---|---|---|
//! | 0 | 56 | identification string |
//! | 56 | 8 | ellipsoid `a` (f64) |
//! | 64 | 8 | ellipsoid `f` (f64) |
//! | 72 | 8 | program tag |
//! | 80 | 32 | `x01`, `y01`, `dx1`, `dy1` in degrees (f64) |
//! | 112 | 12 | `nc`, `nr`, `nz` (i32) |
//!
//! The rest of the record is zero.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::GridError;
use crate::proj::ellipsoid::Ellipsoid;

pub const HEADER_LEN: usize = 128;
pub const IDENT_LEN: usize = 56;
pub const PGM_LEN: usize = 8;

const A_OFF: usize = 56;
const F_OFF: usize = 64;
const PGM_OFF: usize = 72;
const X01_OFF: usize = 80;
const Y01_OFF: usize = 88;
const DX1_OFF: usize = 96;
const DY1_OFF: usize = 104;
const NC_OFF: usize = 112;
const NR_OFF: usize = 116;
const NZ_OFF: usize = 120;

#[derive(Clone, Debug, PartialEq)]
pub struct GridHeader {
    ident: [u8; IDENT_LEN],
    pgm: [u8; PGM_LEN],
    a: f64,
    f: f64,
    x01: f64,
    y01: f64,
    dx1: f64,
    dy1: f64,
    nc: usize,
    nr: usize,
    nz: usize,
}

fn count_at(buf: &[u8], off: usize, name: &str) -> Result<usize, GridError> {
    let v = LittleEndian::read_i32(&buf[off..off + 4]);
    usize::try_from(v)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| GridError::Format(format!("{name} must be positive, got {v}")))
}

fn text_field<const N: usize>(s: &str, name: &str) -> Result<[u8; N], GridError> {
    if !s.is_ascii() || s.len() > N {
        return Err(GridError::Format(format!(
            "{name} must be at most {N} ASCII bytes: {s:?}"
        )));
    }
    let mut out = [0u8; N];
    out[..s.len()].copy_from_slice(s.as_bytes());
    Ok(out)
}

fn text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c == '\0' || c == ' ')
        .to_string()
}

impl GridHeader {
    /// Build and validate a header. Origin and spacing are in degrees.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ident: &str,
        pgm: &str,
        ellipsoid: &Ellipsoid,
        origin: (f64, f64),
        spacing: (f64, f64),
        nc: usize,
        nr: usize,
        nz: usize,
    ) -> Result<Self, GridError> {
        let header = Self {
            ident: text_field(ident, "identification")?,
            pgm: text_field(pgm, "program tag")?,
            a: ellipsoid.a(),
            f: ellipsoid.f(),
            x01: origin.0,
            y01: origin.1,
            dx1: spacing.0,
            dy1: spacing.1,
            nc,
            nr,
            nz,
        };
        header.validate()?;
        Ok(header)
    }

    /// Decode the first [`HEADER_LEN`] bytes of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self, GridError> {
        if buf.len() < HEADER_LEN {
            return Err(GridError::Format(format!(
                "header needs {HEADER_LEN} bytes, file has {}",
                buf.len()
            )));
        }
        let mut ident = [0u8; IDENT_LEN];
        ident.copy_from_slice(&buf[..IDENT_LEN]);
        let mut pgm = [0u8; PGM_LEN];
        pgm.copy_from_slice(&buf[PGM_OFF..PGM_OFF + PGM_LEN]);

        let header = Self {
            ident,
            pgm,
            a: LittleEndian::read_f64(&buf[A_OFF..A_OFF + 8]),
            f: LittleEndian::read_f64(&buf[F_OFF..F_OFF + 8]),
            x01: LittleEndian::read_f64(&buf[X01_OFF..X01_OFF + 8]),
            y01: LittleEndian::read_f64(&buf[Y01_OFF..Y01_OFF + 8]),
            dx1: LittleEndian::read_f64(&buf[DX1_OFF..DX1_OFF + 8]),
            dy1: LittleEndian::read_f64(&buf[DY1_OFF..DY1_OFF + 8]),
            nc: count_at(buf, NC_OFF, "nc")?,
            nr: count_at(buf, NR_OFF, "nr")?,
            nz: count_at(buf, NZ_OFF, "nz")?,
        };
        header.validate()?;
        Ok(header)
    }

    pub fn encode(&self) -> Result<[u8; HEADER_LEN], GridError> {
        let count = |n: usize, name: &str| {
            i32::try_from(n)
                .map_err(|_| GridError::Format(format!("{name} = {n} does not fit the header")))
        };
        let mut buf = [0u8; HEADER_LEN];
        buf[..IDENT_LEN].copy_from_slice(&self.ident);
        LittleEndian::write_f64(&mut buf[A_OFF..A_OFF + 8], self.a);
        LittleEndian::write_f64(&mut buf[F_OFF..F_OFF + 8], self.f);
        buf[PGM_OFF..PGM_OFF + PGM_LEN].copy_from_slice(&self.pgm);
        LittleEndian::write_f64(&mut buf[X01_OFF..X01_OFF + 8], self.x01);
        LittleEndian::write_f64(&mut buf[Y01_OFF..Y01_OFF + 8], self.y01);
        LittleEndian::write_f64(&mut buf[DX1_OFF..DX1_OFF + 8], self.dx1);
        LittleEndian::write_f64(&mut buf[DY1_OFF..DY1_OFF + 8], self.dy1);
        LittleEndian::write_i32(&mut buf[NC_OFF..NC_OFF + 4], count(self.nc, "nc")?);
        LittleEndian::write_i32(&mut buf[NR_OFF..NR_OFF + 4], count(self.nr, "nr")?);
        LittleEndian::write_i32(&mut buf[NZ_OFF..NZ_OFF + 4], count(self.nz, "nz")?);
        Ok(buf)
    }

    fn validate(&self) -> Result<(), GridError> {
        if self.nc == 0 || self.nr == 0 || self.nz == 0 {
            return Err(GridError::Format(format!(
                "empty grid: nc={}, nr={}, nz={}",
                self.nc, self.nr, self.nz
            )));
        }
        for (name, v) in [("x01", self.x01), ("y01", self.y01)] {
            if !v.is_finite() {
                return Err(GridError::Format(format!("{name} is not finite: {v}")));
            }
        }
        for (name, v) in [("dx1", self.dx1), ("dy1", self.dy1)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(GridError::Format(format!("{name} must be positive, got {v}")));
            }
        }
        Ellipsoid::try_new(self.a, self.f)
            .map_err(|e| GridError::Format(format!("grid ellipsoid: {e}")))?;
        self.file_len()?;
        Ok(())
    }

    /// Bytes per record: the header, and each data row.
    pub fn reclen(&self) -> usize {
        (4 * self.nc).max(HEADER_LEN)
    }

    /// Expected length of a complete file.
    pub fn file_len(&self) -> Result<usize, GridError> {
        self.nr
            .checked_mul(self.nz)
            .and_then(|rows| rows.checked_add(1))
            .and_then(|records| records.checked_mul(self.reclen()))
            .ok_or_else(|| GridError::Format("grid dimensions overflow".to_string()))
    }

    pub fn ident(&self) -> String {
        text(&self.ident)
    }

    pub fn pgm(&self) -> String {
        text(&self.pgm)
    }

    /// The ellipsoid the grid was computed on.
    pub fn ellipsoid(&self) -> Ellipsoid {
        Ellipsoid::new(self.a, self.f)
    }

    /// Origin (longitude, latitude) in degrees.
    pub fn origin(&self) -> (f64, f64) {
        (self.x01, self.y01)
    }

    /// Node spacing (longitude, latitude) in degrees.
    pub fn spacing(&self) -> (f64, f64) {
        (self.dx1, self.dy1)
    }

    pub fn nc(&self) -> usize {
        self.nc
    }

    pub fn nr(&self) -> usize {
        self.nr
    }

    pub fn nz(&self) -> usize {
        self.nz
    }
}

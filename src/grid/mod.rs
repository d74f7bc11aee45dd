//! Geoid / height-correction grids stored in the fixed-record binary format.
//!
//! A file is one [`GridHeader`] record followed by `nz` planes of `nr` rows.
//! Each row is one record of `nc` little-endian `f32` nodes, zero-padded to
//! the record length. Rows run northwards from the origin row and columns
//! eastwards from the origin column; node `(col, row)` sits at
//! `(x01 + col·dx1, y01 + row·dy1)` degrees.
//!
//! The whole grid is buffered at load time; lookups are O(1) and the value is
//! immutable afterwards, so a `FileGeo` can be shared across threads.

pub mod header;

use std::borrow::Cow;
use std::f64::consts::TAU;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

use crate::error::GridError;
use crate::resample::InterpolationMethod;

pub use header::GridHeader;

/// Slack, in node units, for points that land on the outermost nodes.
const EDGE_EPS: f64 = 1e-9;

/// What a lookup outside [`FileGeo::limits`] does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutOfBounds {
    /// Return [`GridError::OutOfBounds`].
    #[default]
    Fail,
    /// Use the closest point on the grid boundary.
    Clamp,
}

/// Lookup configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridOptions {
    pub method: InterpolationMethod,
    pub out_of_bounds: OutOfBounds,
    /// Node value marking missing data.
    pub nodata: Option<f32>,
}

pub struct FileGeo {
    header: GridHeader,
    /// Nodes indexed (level, row, col)
    data: Array3<f32>,
    options: GridOptions,
    // Origin and spacing in radians
    x0: f64,
    y0: f64,
    dx: f64,
    dy: f64,
}

impl FileGeo {
    /// Read a grid file with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        Self::open_with(path, GridOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: GridOptions) -> Result<Self, GridError> {
        let path = path.as_ref();
        let grid = Self::load(BufReader::new(File::open(path)?), options)?;
        log::debug!(
            "loaded grid {:?} from {}: {}x{}x{} nodes",
            grid.header.ident(),
            path.display(),
            grid.header.nc(),
            grid.header.nr(),
            grid.header.nz()
        );
        Ok(grid)
    }

    /// Read a complete grid from any byte stream.
    pub fn load<R: Read>(mut reader: R, options: GridOptions) -> Result<Self, GridError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_bytes(&buf, options)
    }

    /// Decode a grid from the bytes of a complete file.
    pub fn from_bytes(buf: &[u8], options: GridOptions) -> Result<Self, GridError> {
        let header = GridHeader::decode(buf)?;
        let expected = header.file_len()?;
        if buf.len() < expected {
            return Err(GridError::Format(format!(
                "truncated grid: {} bytes, header describes {expected}",
                buf.len()
            )));
        }
        if buf.len() > expected {
            log::warn!(
                "grid {:?} has {} trailing bytes after the last record",
                header.ident(),
                buf.len() - expected
            );
        }

        let (nc, nr, nz) = (header.nc(), header.nr(), header.nz());
        let reclen = header.reclen();
        let mut values = vec![0f32; nz * nr * nc];
        // Row i of the flattened (level, row) sequence is record i + 1.
        for (i, out) in values.chunks_exact_mut(nc).enumerate() {
            let start = reclen * (1 + i);
            LittleEndian::read_f32_into(&buf[start..start + 4 * nc], out);
        }
        let data = Array3::from_shape_vec((nz, nr, nc), values)
            .map_err(|e| GridError::Format(format!("grid data: {e}")))?;
        log::debug!("decoded grid {:?}, record length {reclen}", header.ident());
        Ok(Self::assemble(header, data, options))
    }

    /// Build a grid in memory; `data` is indexed (level, row, col).
    pub fn from_parts(
        header: GridHeader,
        data: Array3<f32>,
        options: GridOptions,
    ) -> Result<Self, GridError> {
        let expected = (header.nz(), header.nr(), header.nc());
        if data.dim() != expected {
            return Err(GridError::Format(format!(
                "data shape {:?} does not match header {expected:?}",
                data.dim()
            )));
        }
        Ok(Self::assemble(header, data, options))
    }

    fn assemble(header: GridHeader, data: Array3<f32>, options: GridOptions) -> Self {
        let (x01, y01) = header.origin();
        let (dx1, dy1) = header.spacing();
        Self {
            x0: x01.to_radians(),
            y0: y01.to_radians(),
            dx: dx1.to_radians(),
            dy: dy1.to_radians(),
            header,
            data,
            options,
        }
    }

    /// Serialise in the same record layout [`FileGeo::load`] reads.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<(), GridError> {
        writer.write_all(&self.header.encode()?)?;
        let reclen = self.header.reclen();
        let nc = self.header.nc();
        let mut record = vec![0u8; reclen];
        for row in self.data.rows() {
            let values: Cow<'_, [f32]> = match row.as_slice() {
                Some(s) => Cow::Borrowed(s),
                None => Cow::Owned(row.to_vec()),
            };
            LittleEndian::write_f32_into(&values, &mut record[..4 * nc]);
            writer.write_all(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GridError> {
        let path = path.as_ref();
        self.write(BufWriter::new(File::create(path)?))?;
        log::debug!(
            "saved grid {:?} to {} ({} bytes)",
            self.header.ident(),
            path.display(),
            self.header.file_len()?
        );
        Ok(())
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn with_options(mut self, options: GridOptions) -> Self {
        self.options = options;
        self
    }

    /// All nodes, indexed (level, row, col).
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    pub fn levels(&self) -> usize {
        self.header.nz()
    }

    /// Bounding box of the outermost nodes: (xmin, xmax, ymin, ymax) in radians.
    pub fn limits(&self) -> (f64, f64, f64, f64) {
        let (last_col, last_row) = self.last_node();
        (
            self.x0,
            self.x0 + last_col * self.dx,
            self.y0,
            self.y0 + last_row * self.dy,
        )
    }

    fn last_node(&self) -> (f64, f64) {
        ((self.header.nc() - 1) as f64, (self.header.nr() - 1) as f64)
    }

    /// Whether (lat, lon) in radians lies inside [`limits`](Self::limits).
    /// Longitudes are compared modulo a full turn.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.node_coords(lat, lon).is_some()
    }

    /// Fractional (col, row) of an inside point.
    fn node_coords(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let (last_col, last_row) = self.last_node();
        let turn = TAU / self.dx;
        let mut col = (lon - self.x0).rem_euclid(TAU) / self.dx;
        if col > turn - EDGE_EPS {
            col -= turn;
        }
        let row = (lat - self.y0) / self.dy;
        let inside = |v: f64, last: f64| (-EDGE_EPS..=last + EDGE_EPS).contains(&v);
        (inside(col, last_col) && inside(row, last_row))
            .then(|| (col.clamp(0.0, last_col), row.clamp(0.0, last_row)))
    }

    /// Fractional (col, row) of the closest boundary point.
    fn clamped_coords(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let (last_col, last_row) = self.last_node();
        let turn = TAU / self.dx;
        let mut col = (lon - self.x0).rem_euclid(TAU) / self.dx;
        if col > last_col {
            // past the east edge or short of the west edge, whichever is nearer
            col = if col - last_col < turn - col { last_col } else { 0.0 };
        }
        let row = ((lat - self.y0) / self.dy).clamp(0.0, last_row);
        Some((col, row))
    }

    /// Interpolated value of level 0 at (lat, lon) in radians.
    pub fn value_at(&self, lat: f64, lon: f64) -> Result<f64, GridError> {
        self.value_at_level(0, lat, lon)
    }

    /// Interpolated value of `level` at (lat, lon) in radians.
    pub fn value_at_level(&self, level: usize, lat: f64, lon: f64) -> Result<f64, GridError> {
        if level >= self.levels() {
            return Err(GridError::InvalidLevel(level));
        }
        let (lat_deg, lon_deg) = (lat.to_degrees(), lon.to_degrees());
        let coords = match self.options.out_of_bounds {
            OutOfBounds::Fail => self.node_coords(lat, lon),
            OutOfBounds::Clamp => self
                .node_coords(lat, lon)
                .or_else(|| self.clamped_coords(lat, lon)),
        };
        let (col, row) = coords.ok_or(GridError::OutOfBounds {
            lat: lat_deg,
            lon: lon_deg,
        })?;

        let plane: ArrayView2<'_, f32> = self.data.index_axis(Axis(0), level);
        self.options
            .method
            .sample(&plane, col, row, self.options.nodata)
            .map(f64::from)
            .ok_or(GridError::NoData {
                lat: lat_deg,
                lon: lon_deg,
            })
    }

    /// Level-0 values at many (lat, lon) points, evaluated in parallel.
    pub fn values_at(&self, points: &[(f64, f64)]) -> Vec<Result<f64, GridError>> {
        points
            .par_iter()
            .map(|&(lat, lon)| self.value_at(lat, lon))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use tempfile::TempDir;

    /// 1°×1° grid from (lon 10°, lat 15°), value = lon + 100·lat at each node.
    fn plane_grid(n: usize) -> FileGeo {
        let header =
            GridHeader::new("plane", "test", &WGS84, (10.0, 15.0), (1.0, 1.0), n, n, 1).unwrap();
        let data = Array3::from_shape_fn((1, n, n), |(_, row, col)| {
            (10.0 + col as f64 + 100.0 * (15.0 + row as f64)) as f32
        });
        FileGeo::from_parts(header, data, GridOptions::default()).unwrap()
    }

    fn rad(lat: f64, lon: f64) -> (f64, f64) {
        (lat.to_radians(), lon.to_radians())
    }

    #[test]
    fn test_limits_from_origin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plane.geo");
        plane_grid(6).save(&path).unwrap();

        let grid = FileGeo::open(&path).unwrap();
        let (xmin, xmax, ymin, ymax) = grid.limits();
        assert_relative_eq!(xmin, 10.0_f64.to_radians(), epsilon = 1e-15);
        assert_relative_eq!(ymin, 15.0_f64.to_radians(), epsilon = 1e-15);
        assert_relative_eq!(xmax, 15.0_f64.to_radians(), epsilon = 1e-14);
        assert_relative_eq!(ymax, 20.0_f64.to_radians(), epsilon = 1e-14);
    }

    #[test]
    fn test_save_load_byte_identical() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.geo");
        let second = dir.path().join("b.geo");
        plane_grid(40).save(&first).unwrap();
        FileGeo::open(&first).unwrap().save(&second).unwrap();

        let a = std::fs::read(&first).unwrap();
        let b = std::fs::read(&second).unwrap();
        assert_eq!(a.len(), 160 * 41);
        assert_eq!(a, b);
    }

    #[test]
    fn test_row_padding_layout() {
        let grid = plane_grid(3);
        let mut bytes = Vec::new();
        grid.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 128 * 4);
        // second row, first node: lon 10 + 100·lat 16
        let v = LittleEndian::read_f32(&bytes[256..260]);
        assert_eq!(v, 1610.0);
        assert!(bytes[128 + 12..256].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_column_major_data_writes_same_records() {
        use ndarray::ShapeBuilder;

        let n = 5;
        let header =
            GridHeader::new("plane", "test", &WGS84, (10.0, 15.0), (1.0, 1.0), n, n, 1).unwrap();
        let data = Array3::from_shape_fn((1, n, n).f(), |(_, row, col)| {
            (10.0 + col as f64 + 100.0 * (15.0 + row as f64)) as f32
        });
        let fortran = FileGeo::from_parts(header, data, GridOptions::default()).unwrap();

        let (mut a, mut b) = (Vec::new(), Vec::new());
        plane_grid(n).write(&mut a).unwrap();
        fortran.write(&mut b).unwrap();
        assert_eq!(a, b);

        let reread = FileGeo::from_bytes(&b, GridOptions::default()).unwrap();
        assert_eq!(reread.data(), fortran.data());
        let mut row = [0f32; 5];
        LittleEndian::read_f32_into(&b[2 * 128..2 * 128 + 20], &mut row);
        assert_eq!(row, [1610.0, 1611.0, 1612.0, 1613.0, 1614.0]);
    }

    #[test]
    fn test_bilinear_reproduces_plane() {
        let grid = plane_grid(6);
        for (lat, lon) in [(15.0, 10.0), (15.5, 10.5), (17.25, 12.75), (20.0, 15.0)] {
            let (la, lo) = rad(lat, lon);
            assert_abs_diff_eq!(grid.value_at(la, lo).unwrap(), lon + 100.0 * lat, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_nearest_option() {
        let options = GridOptions {
            method: InterpolationMethod::Nearest,
            ..GridOptions::default()
        };
        let grid = plane_grid(6).with_options(options);
        let (la, lo) = rad(17.3, 12.8);
        assert_eq!(grid.value_at(la, lo).unwrap(), 1713.0);
    }

    #[test]
    fn test_outside_fails_by_default() {
        let grid = plane_grid(6);
        let (la, lo) = rad(14.0, 12.0);
        assert!(!grid.contains(la, lo));
        assert!(matches!(
            grid.value_at(la, lo),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_clamp_policy() {
        let options = GridOptions {
            out_of_bounds: OutOfBounds::Clamp,
            ..GridOptions::default()
        };
        let grid = plane_grid(6).with_options(options);
        let (la, lo) = rad(30.0, 12.0);
        assert_abs_diff_eq!(grid.value_at(la, lo).unwrap(), 12.0 + 2000.0, epsilon = 1e-3);
        let (la, lo) = rad(16.0, 5.0);
        assert_abs_diff_eq!(grid.value_at(la, lo).unwrap(), 10.0 + 1600.0, epsilon = 1e-3);
        let (la, lo) = rad(16.0, 18.0);
        assert_abs_diff_eq!(grid.value_at(la, lo).unwrap(), 15.0 + 1600.0, epsilon = 1e-3);
    }

    #[test]
    fn test_longitude_wraps() {
        let grid = plane_grid(6);
        let (la, lo) = rad(16.0, 11.0 + 360.0);
        assert!(grid.contains(la, lo));
        assert_abs_diff_eq!(grid.value_at(la, lo).unwrap(), 1611.0, epsilon = 1e-3);
    }

    #[test]
    fn test_nodata() {
        let header =
            GridHeader::new("holes", "test", &WGS84, (0.0, 0.0), (1.0, 1.0), 2, 2, 1).unwrap();
        let data = Array3::from_shape_vec((1, 2, 2), vec![1.0, -9999.0, 3.0, 4.0]).unwrap();
        let options = GridOptions {
            nodata: Some(-9999.0),
            ..GridOptions::default()
        };
        let grid = FileGeo::from_parts(header, data, options).unwrap();
        // every bilinear cell touches the hole
        assert!(matches!(
            grid.value_at(0.005, 0.005),
            Err(GridError::NoData { .. })
        ));

        let grid = grid.with_options(GridOptions {
            method: InterpolationMethod::Nearest,
            ..options
        });
        assert_eq!(grid.value_at(0.0, 0.0).unwrap(), 1.0);
        assert!(grid.value_at(0.0, 0.015).is_err());
    }

    #[test]
    fn test_levels() {
        let header =
            GridHeader::new("stack", "test", &WGS84, (0.0, 0.0), (1.0, 1.0), 2, 2, 3).unwrap();
        let data = Array3::from_shape_fn((3, 2, 2), |(level, _, _)| level as f32 * 10.0);
        let grid = FileGeo::from_parts(header, data, GridOptions::default()).unwrap();

        let mut bytes = Vec::new();
        grid.write(&mut bytes).unwrap();
        let grid = FileGeo::from_bytes(&bytes, GridOptions::default()).unwrap();
        assert_eq!(grid.levels(), 3);
        assert_eq!(grid.value_at_level(2, 0.01, 0.01).unwrap(), 20.0);
        assert!(matches!(
            grid.value_at_level(3, 0.01, 0.01),
            Err(GridError::InvalidLevel(3))
        ));
    }

    #[test]
    fn test_truncated_file() {
        let mut bytes = Vec::new();
        plane_grid(6).write(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            FileGeo::from_bytes(&bytes, GridOptions::default()),
            Err(GridError::Format(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_tolerated() {
        let mut bytes = Vec::new();
        plane_grid(6).write(&mut bytes).unwrap();
        bytes.extend_from_slice(&[0xAB; 17]);
        let grid = FileGeo::from_bytes(&bytes, GridOptions::default()).unwrap();
        assert_eq!(grid.header().nc(), 6);
    }

    #[test]
    fn test_bad_header() {
        let mut bytes = Vec::new();
        plane_grid(6).write(&mut bytes).unwrap();
        LittleEndian::write_i32(&mut bytes[112..116], 0);
        assert!(matches!(
            FileGeo::from_bytes(&bytes, GridOptions::default()),
            Err(GridError::Format(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FileGeo::open(dir.path().join("absent.geo")),
            Err(GridError::Io(_))
        ));
    }

    #[test]
    fn test_from_parts_shape_mismatch() {
        let header =
            GridHeader::new("x", "test", &WGS84, (0.0, 0.0), (1.0, 1.0), 3, 2, 1).unwrap();
        let data = Array3::zeros((1, 3, 2));
        assert!(FileGeo::from_parts(header, data, GridOptions::default()).is_err());
    }

    #[test]
    fn test_parallel_lookups_match_sequential() {
        let grid = plane_grid(20);
        let points: Vec<_> = (0..500)
            .map(|i| rad(15.0 + (i % 19) as f64 * 0.9, 10.0 + (i % 23) as f64 * 0.8))
            .collect();
        let parallel = grid.values_at(&points);
        for (p, r) in points.iter().zip(parallel) {
            let seq = grid.value_at(p.0, p.1).unwrap();
            assert_eq!(r.unwrap().to_bits(), seq.to_bits());
        }
    }
}

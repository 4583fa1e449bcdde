//! Cell types stored in attribute table columns.
//!
//! A table kind fixes its cell type; all columns of one table share it.
//! The [`Cell`] trait supplies the per-cell field count, the ASCII and
//! native-endian binary codecs, and the interpolation rule used by
//! deformation transfer.

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use std::fmt::Write as _;
use std::io::{self, Read, Write};

/// A fixed-width per-vertex cell value.
pub trait Cell: Copy + Default + PartialEq + std::fmt::Debug + 'static {
    /// Number of whitespace-separated numeric fields per cell in a data row.
    const FIELDS: usize;

    /// Parse exactly [`Cell::FIELDS`] ASCII fields. Returns `None` on a
    /// malformed field; the codec attaches path/line context.
    fn parse_fields(fields: &[&str]) -> Option<Self>;

    /// Append the cell's ASCII fields to a row buffer, space separated,
    /// with a leading space per field.
    fn write_fields(&self, out: &mut String);

    /// Read one cell from a native-endian binary stream.
    fn read_binary<R: Read>(r: &mut R) -> io::Result<Self>;

    /// Write one cell to a native-endian binary stream.
    fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()>;

    /// Combine the cells at a deformation tile's three corners.
    ///
    /// Numeric cells take the barycentric weighted sum. Label-valued
    /// cells take the cell at the largest weight, ties broken by the
    /// smallest source vertex index.
    fn interpolate(values: [Self; 3], nodes: [i32; 3], weights: [f32; 3]) -> Self;
}

/// Slot of the dominant barycentric weight; ties go to the smallest
/// source vertex index.
pub(crate) fn dominant_corner(nodes: [i32; 3], weights: [f32; 3]) -> usize {
    let mut best = 0;
    for i in 1..3 {
        if weights[i] > weights[best]
            || (weights[i] == weights[best] && nodes[i] < nodes[best])
        {
            best = i;
        }
    }
    best
}

impl Cell for f32 {
    const FIELDS: usize = 1;

    fn parse_fields(fields: &[&str]) -> Option<Self> {
        fields.first()?.parse().ok()
    }

    fn write_fields(&self, out: &mut String) {
        let _ = write!(out, " {}", self);
    }

    fn read_binary<R: Read>(r: &mut R) -> io::Result<Self> {
        r.read_f32::<NativeEndian>()
    }

    fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_f32::<NativeEndian>(*self)
    }

    fn interpolate(values: [Self; 3], _nodes: [i32; 3], weights: [f32; 3]) -> Self {
        values[0] * weights[0] + values[1] * weights[1] + values[2] * weights[2]
    }
}

/// Paint label index. Interpolation is majority-by-weight, never a blend.
impl Cell for i32 {
    const FIELDS: usize = 1;

    fn parse_fields(fields: &[&str]) -> Option<Self> {
        fields.first()?.parse().ok()
    }

    fn write_fields(&self, out: &mut String) {
        let _ = write!(out, " {}", self);
    }

    fn read_binary<R: Read>(r: &mut R) -> io::Result<Self> {
        r.read_i32::<NativeEndian>()
    }

    fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_i32::<NativeEndian>(*self)
    }

    fn interpolate(values: [Self; 3], nodes: [i32; 3], weights: [f32; 3]) -> Self {
        values[dominant_corner(nodes, weights)]
    }
}

/// RGB color cell. Components are floats so legacy byte-range and
/// normalized `[0, 1]` files share storage; the column scale says which.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl Cell for Rgb {
    const FIELDS: usize = 3;

    fn parse_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < 3 {
            return None;
        }
        Some(Self {
            r: fields[0].parse().ok()?,
            g: fields[1].parse().ok()?,
            b: fields[2].parse().ok()?,
        })
    }

    fn write_fields(&self, out: &mut String) {
        let _ = write!(out, " {} {} {}", self.r, self.g, self.b);
    }

    fn read_binary<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            r: r.read_f32::<NativeEndian>()?,
            g: r.read_f32::<NativeEndian>()?,
            b: r.read_f32::<NativeEndian>()?,
        })
    }

    fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_f32::<NativeEndian>(self.r)?;
        w.write_f32::<NativeEndian>(self.g)?;
        w.write_f32::<NativeEndian>(self.b)
    }

    fn interpolate(values: [Self; 3], _nodes: [i32; 3], weights: [f32; 3]) -> Self {
        let mut out = Self::default();
        for i in 0..3 {
            out.r += values[i].r * weights[i];
            out.g += values[i].g * weights[i];
            out.b += values[i].b * weights[i];
        }
        out
    }
}

/// Latitude/longitude cell with the deformed pair alongside.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LatLon {
    pub lat: f32,
    pub lon: f32,
    pub deformed_lat: f32,
    pub deformed_lon: f32,
}

impl Cell for LatLon {
    const FIELDS: usize = 4;

    fn parse_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < 4 {
            return None;
        }
        Some(Self {
            lat: fields[0].parse().ok()?,
            lon: fields[1].parse().ok()?,
            deformed_lat: fields[2].parse().ok()?,
            deformed_lon: fields[3].parse().ok()?,
        })
    }

    fn write_fields(&self, out: &mut String) {
        let _ = write!(
            out,
            " {} {} {} {}",
            self.lat, self.lon, self.deformed_lat, self.deformed_lon
        );
    }

    fn read_binary<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            lat: r.read_f32::<NativeEndian>()?,
            lon: r.read_f32::<NativeEndian>()?,
            deformed_lat: r.read_f32::<NativeEndian>()?,
            deformed_lon: r.read_f32::<NativeEndian>()?,
        })
    }

    fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_f32::<NativeEndian>(self.lat)?;
        w.write_f32::<NativeEndian>(self.lon)?;
        w.write_f32::<NativeEndian>(self.deformed_lat)?;
        w.write_f32::<NativeEndian>(self.deformed_lon)
    }

    fn interpolate(values: [Self; 3], _nodes: [i32; 3], weights: [f32; 3]) -> Self {
        let mut out = Self::default();
        for i in 0..3 {
            out.lat += values[i].lat * weights[i];
            out.lon += values[i].lon * weights[i];
            out.deformed_lat += values[i].deformed_lat * weights[i];
            out.deformed_lon += values[i].deformed_lon * weights[i];
        }
        out
    }
}

/// Surface vector cell (three signed floats).
impl Cell for glam::Vec3 {
    const FIELDS: usize = 3;

    fn parse_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < 3 {
            return None;
        }
        Some(Self::new(
            fields[0].parse().ok()?,
            fields[1].parse().ok()?,
            fields[2].parse().ok()?,
        ))
    }

    fn write_fields(&self, out: &mut String) {
        let _ = write!(out, " {} {} {}", self.x, self.y, self.z);
    }

    fn read_binary<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self::new(
            r.read_f32::<NativeEndian>()?,
            r.read_f32::<NativeEndian>()?,
            r.read_f32::<NativeEndian>()?,
        ))
    }

    fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_f32::<NativeEndian>(self.x)?;
        w.write_f32::<NativeEndian>(self.y)?;
        w.write_f32::<NativeEndian>(self.z)
    }

    fn interpolate(values: [Self; 3], _nodes: [i32; 3], weights: [f32; 3]) -> Self {
        values[0] * weights[0] + values[1] * weights[1] + values[2] * weights[2]
    }
}

/// Geodesic distance cell: parent vertex plus distance along the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeodesicCell {
    pub parent_node: i32,
    pub parent_distance: f32,
}

impl Default for GeodesicCell {
    fn default() -> Self {
        Self {
            parent_node: -1,
            parent_distance: 0.0,
        }
    }
}

impl Cell for GeodesicCell {
    const FIELDS: usize = 2;

    fn parse_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < 2 {
            return None;
        }
        Some(Self {
            parent_node: fields[0].parse().ok()?,
            parent_distance: fields[1].parse().ok()?,
        })
    }

    fn write_fields(&self, out: &mut String) {
        let _ = write!(out, " {} {}", self.parent_node, self.parent_distance);
    }

    fn read_binary<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            parent_node: r.read_i32::<NativeEndian>()?,
            parent_distance: r.read_f32::<NativeEndian>()?,
        })
    }

    fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_i32::<NativeEndian>(self.parent_node)?;
        w.write_f32::<NativeEndian>(self.parent_distance)
    }

    // Parent links are vertex identities, not magnitudes.
    fn interpolate(values: [Self; 3], nodes: [i32; 3], weights: [f32; 3]) -> Self {
        values[dominant_corner(nodes, weights)]
    }
}

/// Areal estimation cell: four candidate labels with probabilities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArealCell {
    pub labels: [i32; 4],
    pub probabilities: [f32; 4],
}

impl Default for ArealCell {
    fn default() -> Self {
        Self {
            labels: [-1; 4],
            probabilities: [0.0; 4],
        }
    }
}

impl Cell for ArealCell {
    const FIELDS: usize = 8;

    fn parse_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < 8 {
            return None;
        }
        let mut cell = Self::default();
        for i in 0..4 {
            cell.labels[i] = fields[i].parse().ok()?;
        }
        for i in 0..4 {
            cell.probabilities[i] = fields[4 + i].parse().ok()?;
        }
        Some(cell)
    }

    fn write_fields(&self, out: &mut String) {
        for label in self.labels {
            let _ = write!(out, " {}", label);
        }
        for p in self.probabilities {
            let _ = write!(out, " {}", p);
        }
    }

    fn read_binary<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut cell = Self::default();
        for label in &mut cell.labels {
            *label = r.read_i32::<NativeEndian>()?;
        }
        for p in &mut cell.probabilities {
            *p = r.read_f32::<NativeEndian>()?;
        }
        Ok(cell)
    }

    fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for label in self.labels {
            w.write_i32::<NativeEndian>(label)?;
        }
        for p in self.probabilities {
            w.write_f32::<NativeEndian>(p)?;
        }
        Ok(())
    }

    // Labels do not blend; keep the dominant corner's estimate.
    fn interpolate(values: [Self; 3], nodes: [i32; 3], weights: [f32; 3]) -> Self {
        values[dominant_corner(nodes, weights)]
    }
}

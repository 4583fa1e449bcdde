//! FreeSurfer curvature and functional file import.
//!
//! Curvature files carry one value per vertex; functional files are
//! sparse `(vertex, value)` pairs with unlisted vertices at zero.
//! Either lands as one new column on a metric or shape table.

use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};
use tracing::info;

use super::{basename, read_bytes, read_text, ImportFormat};
use crate::table::{AttrTable, ColumnMetadata};
use crate::util::text;
use crate::util::{Error, Result};

/// Marks the current FreeSurfer binary curvature format.
const CURV_MAGIC: [u8; 3] = [0xff, 0xff, 0xff];

/// Import a FreeSurfer curvature file as one new column.
///
/// `num_nodes` is the vertex count of the companion surface; it must be
/// known before importing. Returns the new column's index.
pub fn import_curvature(
    table: &mut AttrTable<f32>,
    num_nodes: usize,
    path: impl AsRef<Path>,
    format: ImportFormat,
) -> Result<usize> {
    let path = path.as_ref();
    check_surface_loaded(num_nodes)?;

    let values = match format {
        ImportFormat::Ascii => read_curvature_ascii(path, num_nodes)?,
        ImportFormat::Binary => read_curvature_binary(path, num_nodes)?,
    };
    let index = append_imported_column(table, &values, path)?;
    info!(path = %path.display(), column = index, "imported curvature file");
    Ok(index)
}

/// Import a FreeSurfer functional file as one new column.
pub fn import_functional(
    table: &mut AttrTable<f32>,
    num_nodes: usize,
    path: impl AsRef<Path>,
    format: ImportFormat,
) -> Result<usize> {
    let path = path.as_ref();
    check_surface_loaded(num_nodes)?;

    let values = match format {
        ImportFormat::Ascii => read_functional_ascii(path, num_nodes)?,
        ImportFormat::Binary => read_functional_binary(path, num_nodes)?,
    };
    let index = append_imported_column(table, &values, path)?;
    info!(path = %path.display(), column = index, "imported functional file");
    Ok(index)
}

fn check_surface_loaded(num_nodes: usize) -> Result<()> {
    if num_nodes == 0 {
        return Err(Error::PolicyViolation(
            "a surface must be loaded before importing per-vertex data".to_string(),
        ));
    }
    Ok(())
}

fn append_imported_column(
    table: &mut AttrTable<f32>,
    values: &[f32],
    path: &Path,
) -> Result<usize> {
    let name = basename(path);
    table.push_column(values, ColumnMetadata::named(&name))?;
    let line = format!("Imported from {}", name);
    if table.file_comment().is_empty() {
        table.set_file_comment(line);
    } else {
        table.append_file_comment(&format!("\n{}", line));
    }
    Ok(table.num_columns() - 1)
}

/// ASCII curvature rows: `vertex x y z value`.
fn read_curvature_ascii(path: &Path, num_nodes: usize) -> Result<Vec<f32>> {
    let content = read_text(path)?;
    let mut values = vec![0.0f32; num_nodes];
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = text::tokenize(line);
        if fields.len() != 5 {
            return Err(Error::format(
                path,
                lineno as u64 + 1,
                format!("curvature row has {} fields, expected 5", fields.len()),
            ));
        }
        let vertex = parse_vertex(path, lineno, fields[0], num_nodes)?;
        let value: f32 = fields[4].parse().map_err(|_| {
            Error::format(path, lineno as u64 + 1, "malformed curvature value")
        })?;
        values[vertex] = value;
    }
    Ok(values)
}

/// Binary curvature: 3-byte magic, vertex/face counts, values per
/// vertex (must be 1), then one big-endian float per vertex.
fn read_curvature_binary(path: &Path, num_nodes: usize) -> Result<Vec<f32>> {
    let data = read_bytes(path)?;
    let mut cursor = data.as_slice();

    let mut magic = [0u8; 3];
    std::io::Read::read_exact(&mut cursor, &mut magic).map_err(|_| truncated(path))?;
    if magic != CURV_MAGIC {
        return Err(Error::format(path, 0, "unrecognized curvature file magic"));
    }
    let vertices = cursor.read_i32::<BigEndian>().map_err(|_| truncated(path))?;
    let _faces = cursor.read_i32::<BigEndian>().map_err(|_| truncated(path))?;
    let per_vertex = cursor.read_i32::<BigEndian>().map_err(|_| truncated(path))?;
    if vertices as usize != num_nodes {
        return Err(Error::shape(num_nodes, vertices.max(0) as usize));
    }
    if per_vertex != 1 {
        return Err(Error::format(
            path,
            0,
            format!("expected 1 value per vertex, file declares {}", per_vertex),
        ));
    }

    let mut values = Vec::with_capacity(num_nodes);
    for _ in 0..num_nodes {
        values.push(cursor.read_f32::<BigEndian>().map_err(|_| truncated(path))?);
    }
    Ok(values)
}

/// ASCII functional rows: sparse `vertex value` pairs.
fn read_functional_ascii(path: &Path, num_nodes: usize) -> Result<Vec<f32>> {
    let content = read_text(path)?;
    let mut values = vec![0.0f32; num_nodes];
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = text::tokenize(line);
        if fields.len() != 2 {
            return Err(Error::format(
                path,
                lineno as u64 + 1,
                format!("functional row has {} fields, expected 2", fields.len()),
            ));
        }
        let vertex = parse_vertex(path, lineno, fields[0], num_nodes)?;
        let value: f32 = fields[1].parse().map_err(|_| {
            Error::format(path, lineno as u64 + 1, "malformed functional value")
        })?;
        values[vertex] = value;
    }
    Ok(values)
}

/// Binary functional: big-endian entry count, then `(vertex, value)`
/// pairs.
fn read_functional_binary(path: &Path, num_nodes: usize) -> Result<Vec<f32>> {
    let data = read_bytes(path)?;
    let mut cursor = data.as_slice();

    let count = cursor.read_i32::<BigEndian>().map_err(|_| truncated(path))?;
    if count < 0 {
        return Err(Error::format(path, 0, "negative entry count"));
    }
    let mut values = vec![0.0f32; num_nodes];
    for _ in 0..count {
        let vertex = cursor.read_i32::<BigEndian>().map_err(|_| truncated(path))?;
        let value = cursor.read_f32::<BigEndian>().map_err(|_| truncated(path))?;
        if vertex < 0 || vertex as usize >= num_nodes {
            return Err(Error::format(
                path,
                0,
                format!("functional entry for vertex {} of {}", vertex, num_nodes),
            ));
        }
        values[vertex as usize] = value;
    }
    Ok(values)
}

fn parse_vertex(path: &Path, lineno: usize, field: &str, num_nodes: usize) -> Result<usize> {
    let vertex: usize = field
        .parse()
        .map_err(|_| Error::format(path, lineno as u64 + 1, "malformed vertex index"))?;
    if vertex >= num_nodes {
        return Err(Error::format(
            path,
            lineno as u64 + 1,
            format!("data for vertex {} but the surface has {}", vertex, num_nodes),
        ));
    }
    Ok(vertex)
}

fn truncated(path: &Path) -> Error {
    Error::format(path, 0, "file truncated")
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_ascii_curvature_import() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0 1.0 2.0 3.0 0.25").unwrap();
        writeln!(file, "2 4.0 5.0 6.0 -0.5").unwrap();
        let mut table: AttrTable<f32> = AttrTable::new();
        let col = import_curvature(&mut table, 3, file.path(), ImportFormat::Ascii).unwrap();
        assert_eq!(col, 0);
        assert_eq!(table.num_nodes(), 3);
        assert_eq!(table.cell(0, 0), 0.25);
        assert_eq!(table.cell(1, 0), 0.0);
        assert_eq!(table.cell(2, 0), -0.5);
        assert!(table.file_comment().starts_with("Imported from"));
    }

    #[test]
    fn test_binary_curvature_import() {
        let mut file = NamedTempFile::new().unwrap();
        {
            let f = file.as_file_mut();
            f.write_all(&CURV_MAGIC).unwrap();
            f.write_i32::<BigEndian>(2).unwrap();
            f.write_i32::<BigEndian>(0).unwrap();
            f.write_i32::<BigEndian>(1).unwrap();
            f.write_f32::<BigEndian>(0.5).unwrap();
            f.write_f32::<BigEndian>(-1.5).unwrap();
        }
        let mut table: AttrTable<f32> = AttrTable::new();
        import_curvature(&mut table, 2, file.path(), ImportFormat::Binary).unwrap();
        assert_eq!(table.cell(0, 0), 0.5);
        assert_eq!(table.cell(1, 0), -1.5);
    }

    #[test]
    fn test_binary_curvature_node_count_mismatch() {
        let mut file = NamedTempFile::new().unwrap();
        {
            let f = file.as_file_mut();
            f.write_all(&CURV_MAGIC).unwrap();
            f.write_i32::<BigEndian>(5).unwrap();
            f.write_i32::<BigEndian>(0).unwrap();
            f.write_i32::<BigEndian>(1).unwrap();
        }
        let mut table: AttrTable<f32> = AttrTable::new();
        assert!(matches!(
            import_curvature(&mut table, 2, file.path(), ImportFormat::Binary),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_ascii_functional_sparse() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "1 7.5").unwrap();
        let mut table: AttrTable<f32> = AttrTable::new();
        import_functional(&mut table, 3, file.path(), ImportFormat::Ascii).unwrap();
        assert_eq!(table.cell(0, 0), 0.0);
        assert_eq!(table.cell(1, 0), 7.5);
        assert_eq!(table.cell(2, 0), 0.0);
    }

    #[test]
    fn test_functional_vertex_out_of_range() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "9 7.5").unwrap();
        let mut table: AttrTable<f32> = AttrTable::new();
        assert!(matches!(
            import_functional(&mut table, 3, file.path(), ImportFormat::Ascii),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_requires_loaded_surface() {
        let mut table: AttrTable<f32> = AttrTable::new();
        assert!(matches!(
            import_curvature(&mut table, 0, "missing.curv", ImportFormat::Ascii),
            Err(Error::PolicyViolation(_))
        ));
    }

    #[test]
    fn test_appends_to_existing_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0 0 0 0 9.0").unwrap();
        let mut table: AttrTable<f32> = AttrTable::with_size(1, 1);
        table.column_mut(0).name = "existing".to_string();
        let col = import_curvature(&mut table, 1, file.path(), ImportFormat::Ascii).unwrap();
        assert_eq!(col, 1);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.column(0).name, "existing");
    }
}

//! Import per-point data from an ASCII legacy VTK polydata file.
//!
//! Two point-data shapes land as RGB columns: three-component
//! `unsigned_char` scalars map directly, and single-component `float`
//! scalars go through the file's lookup table when one is defined
//! (grayscale otherwise). Float data that never exceeds `1.0` switches
//! the column scales to `[0, 1]`.

use std::path::Path;

use tracing::info;

use super::{basename, read_text};
use crate::table::{ColumnMetadata, Rgb, RgbPaintTable, Scale};
use crate::util::text;
use crate::util::{Error, Result};

/// Import VTK point data as one new RGB column. Returns its index.
pub fn import_vtk_point_data(table: &mut RgbPaintTable, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let content = read_text(path)?;
    let lines: Vec<&str> = content.lines().collect();

    let mut num_points = None;
    let mut scalars: Option<ScalarData> = None;
    let mut lookup: Option<Vec<Rgb>> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        let fields = text::tokenize(line);
        match fields.first().copied() {
            Some("POINT_DATA") => {
                let n: usize = fields
                    .get(1)
                    .and_then(|f| f.parse().ok())
                    .ok_or_else(|| Error::format(path, i as u64 + 1, "malformed POINT_DATA"))?;
                num_points = Some(n);
                i += 1;
            }
            Some("SCALARS") if num_points.is_some() => {
                let n = num_points.unwrap_or(0);
                let data_type = fields.get(2).copied().unwrap_or_default().to_string();
                let components: usize = fields.get(3).and_then(|f| f.parse().ok()).unwrap_or(1);
                i += 1;
                // An attribute's LOOKUP_TABLE line names the mapping; it
                // carries no values itself.
                if lines
                    .get(i)
                    .is_some_and(|l| text::tokenize(l).len() == 2 && l.trim_start().starts_with("LOOKUP_TABLE"))
                {
                    i += 1;
                }
                let (values, next) = read_floats(path, &lines, i, n * components)?;
                i = next;
                if scalars.is_none() {
                    scalars = Some(ScalarData {
                        data_type,
                        components,
                        values,
                    });
                }
            }
            Some("COLOR_SCALARS") if num_points.is_some() => {
                let n = num_points.unwrap_or(0);
                let components: usize = fields.get(2).and_then(|f| f.parse().ok()).unwrap_or(3);
                i += 1;
                let (values, next) = read_floats(path, &lines, i, n * components)?;
                i = next;
                if scalars.is_none() {
                    // COLOR_SCALARS are normalized floats; treat like
                    // direct color data.
                    scalars = Some(ScalarData {
                        data_type: "unsigned_char".to_string(),
                        components,
                        values: values.iter().map(|v| v * 255.0).collect(),
                    });
                }
            }
            Some("LOOKUP_TABLE") if fields.len() == 3 => {
                let size: usize = fields
                    .get(2)
                    .and_then(|f| f.parse().ok())
                    .ok_or_else(|| Error::format(path, i as u64 + 1, "malformed LOOKUP_TABLE"))?;
                i += 1;
                let (values, next) = read_floats(path, &lines, i, size * 4)?;
                i = next;
                lookup = Some(
                    values
                        .chunks_exact(4)
                        .map(|rgba| Rgb::new(rgba[0] * 255.0, rgba[1] * 255.0, rgba[2] * 255.0))
                        .collect(),
                );
            }
            _ => i += 1,
        }
    }

    let num_points =
        num_points.ok_or_else(|| Error::format(path, 0, "file has no POINT_DATA section"))?;
    let scalars =
        scalars.ok_or_else(|| Error::format(path, 0, "file has no per-point scalars"))?;
    if !table.is_empty() && table.num_nodes() != num_points {
        return Err(Error::shape(table.num_nodes(), num_points));
    }

    let mut meta = ColumnMetadata::named(basename(path));
    let cells = match (scalars.data_type.as_str(), scalars.components) {
        ("unsigned_char", 3) => scalars
            .values
            .chunks_exact(3)
            .map(|rgb| Rgb::new(rgb[0], rgb[1], rgb[2]))
            .collect::<Vec<_>>(),
        ("float", 1) => {
            let max = scalars.values.iter().copied().fold(f32::MIN, f32::max);
            if max <= 1.0 {
                meta.channels.scales = [Scale::UNIT; 3];
            }
            match &lookup {
                Some(entries) if !entries.is_empty() => scalars
                    .values
                    .iter()
                    .map(|&v| {
                        let slot = (v.clamp(0.0, 1.0) * (entries.len() - 1) as f32).round();
                        entries[slot as usize]
                    })
                    .collect(),
                _ => scalars.values.iter().map(|&v| Rgb::new(v, v, v)).collect(),
            }
        }
        (other, comps) => {
            return Err(Error::format(
                path,
                0,
                format!("unsupported point data: {} x{}", other, comps),
            ))
        }
    };

    table.push_column(&cells, meta)?;
    let index = table.num_columns() - 1;
    info!(path = %path.display(), column = index, points = num_points, "imported VTK point data");
    Ok(index)
}

struct ScalarData {
    data_type: String,
    components: usize,
    values: Vec<f32>,
}

/// Gather `count` whitespace-separated floats starting at line `start`.
/// Returns the values and the index of the first unconsumed line.
fn read_floats(
    path: &Path,
    lines: &[&str],
    start: usize,
    count: usize,
) -> Result<(Vec<f32>, usize)> {
    let mut values = Vec::with_capacity(count);
    let mut i = start;
    while values.len() < count {
        let line = lines
            .get(i)
            .ok_or_else(|| Error::format(path, i as u64, "point data truncated"))?;
        for field in text::tokenize(line) {
            let value: f32 = field
                .parse()
                .map_err(|_| Error::format(path, i as u64 + 1, "malformed point data value"))?;
            values.push(value);
        }
        i += 1;
    }
    if values.len() != count {
        return Err(Error::format(
            path,
            i as u64,
            format!("expected {} values, found {}", count, values.len()),
        ));
    }
    Ok((values, i))
}

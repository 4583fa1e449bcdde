//! SUMA node-color file import.
//!
//! Layout: `#`-prefixed header lines, of which `#N_Nodes = <n>`
//! declares the vertex count, then `vertex r g b` rows. SUMA writes
//! components in `[0, 1]`, so the first component found strictly inside
//! that interval switches the column scales from the byte-range default.

use std::path::Path;

use tracing::info;

use super::{basename, read_text};
use crate::table::{ColumnMetadata, Rgb, RgbPaintTable, Scale};
use crate::util::text;
use crate::util::{Error, Result};

const NODE_COUNT_KEY: &str = "#N_Nodes";

/// Import a SUMA RGB file as one new column. Returns its index.
pub fn import_suma_rgb(table: &mut RgbPaintTable, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let content = read_text(path)?;

    let mut cells: Option<Vec<Rgb>> = None;
    let mut unit_scale = false;
    let mut read_data = false;
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if line.starts_with(NODE_COUNT_KEY) {
                let count: usize = line
                    .rsplit(['=', ' '])
                    .find(|t| !t.is_empty())
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| {
                        Error::format(path, lineno as u64 + 1, "malformed #N_Nodes header")
                    })?;
                if !table.is_empty() && table.num_nodes() != count {
                    return Err(Error::shape(table.num_nodes(), count));
                }
                cells = Some(vec![Rgb::default(); count]);
            }
            continue;
        }

        let cells = cells.as_mut().ok_or_else(|| {
            Error::format(path, lineno as u64 + 1, "data row before the #N_Nodes header")
        })?;
        let fields = text::tokenize(line);
        if fields.len() < 4 {
            return Err(Error::format(
                path,
                lineno as u64 + 1,
                format!("row has {} fields, expected 4", fields.len()),
            ));
        }
        let vertex: usize = fields[0]
            .parse()
            .map_err(|_| Error::format(path, lineno as u64 + 1, "malformed vertex index"))?;
        if vertex >= cells.len() {
            return Err(Error::format(
                path,
                lineno as u64 + 1,
                format!("color for vertex {} but the file declares {}", vertex, cells.len()),
            ));
        }
        let cell = parse_rgb(&fields[1..4])
            .ok_or_else(|| Error::format(path, lineno as u64 + 1, "malformed color value"))?;
        for v in [cell.r, cell.g, cell.b] {
            if v > 0.0 && v < 1.0 {
                unit_scale = true;
            }
        }
        cells[vertex] = cell;
        read_data = true;
    }

    if !read_data {
        return Err(Error::format(path, 0, "never found RGB data"));
    }
    let cells = cells.unwrap_or_default();

    let mut meta = ColumnMetadata::named(basename(path));
    if unit_scale {
        meta.channels.scales = [Scale::UNIT; 3];
    }
    table.push_column(&cells, meta)?;
    let index = table.num_columns() - 1;
    info!(
        path = %path.display(),
        column = index,
        unit_scale,
        "imported SUMA node colors"
    );
    Ok(index)
}

fn parse_rgb(fields: &[&str]) -> Option<Rgb> {
    Some(Rgb::new(
        fields.first()?.parse().ok()?,
        fields.get(1)?.parse().ok()?,
        fields.get(2)?.parse().ok()?,
    ))
}

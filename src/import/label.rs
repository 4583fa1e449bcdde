//! FreeSurfer ASCII label file import.
//!
//! A label file lists the vertices belonging to one named region. The
//! region name comes from the file name; vertices in the file get that
//! label's index in the destination paint column. Names without a color
//! get one synthesized into the color table.

use std::path::Path;

use tracing::{info, warn};

use super::{basename, read_text};
use crate::color::ColorTable;
use crate::table::{ColumnMetadata, PaintTable};
use crate::util::text;
use crate::util::{Error, Result};

/// Ordered label-name registry for a paint table. Index 0 is the
/// unassigned label `???`; zero-filled cells therefore read as
/// unassigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelNames {
    names: Vec<String>,
}

impl Default for LabelNames {
    fn default() -> Self {
        Self {
            names: vec!["???".to_string()],
        }
    }
}

impl LabelNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, registering it when unseen.
    pub fn index_of(&mut self, name: &str) -> i32 {
        match self.names.iter().position(|n| n == name) {
            Some(i) => i as i32,
            None => {
                self.names.push(name.to_string());
                (self.names.len() - 1) as i32
            }
        }
    }

    pub fn name(&self, index: i32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Import FreeSurfer label file(s) as one new paint column.
///
/// With `scan_directory` set, every `.label` file in the named file's
/// directory lands in the same column (later files win overlapping
/// vertices). Unknown label names get a synthesized color. Returns the
/// new column's index.
pub fn import_label_file(
    table: &mut PaintTable,
    num_nodes: usize,
    path: impl AsRef<Path>,
    names: &mut LabelNames,
    colors: &mut ColorTable,
    scan_directory: bool,
) -> Result<usize> {
    let path = path.as_ref();
    if num_nodes == 0 {
        return Err(Error::PolicyViolation(
            "a surface must be loaded before importing a label file".to_string(),
        ));
    }

    let mut values = vec![0i32; num_nodes];
    let comment;
    if scan_directory {
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let mut label_files = find_label_files(directory)?;
        if label_files.is_empty() {
            return Err(Error::format(
                directory,
                0,
                "no files with extension '.label' in directory",
            ));
        }
        label_files.sort();
        for file in &label_files {
            apply_label_file(file, num_nodes, &mut values, names, colors)?;
        }
        comment = format!(
            "Imported from multiple files starting with {}",
            basename(&label_files[0])
        );
    } else {
        apply_label_file(path, num_nodes, &mut values, names, colors)?;
        comment = format!("Imported from {}", basename(path));
    }

    table.push_column(&values, ColumnMetadata::named(basename(path)))?;
    if table.file_comment().is_empty() {
        table.set_file_comment(comment);
    } else {
        table.append_file_comment(&format!("\n{}", comment));
    }
    let index = table.num_columns() - 1;
    info!(
        path = %path.display(),
        column = index,
        labels = names.len(),
        "imported label file(s)"
    );
    Ok(index)
}

fn find_label_files(directory: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "label") && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Parse one label file into the shared per-vertex label buffer.
///
/// Layout: a `#!ascii` comment line, a vertex count, then
/// `vertex x y z stat` rows.
fn apply_label_file(
    path: &Path,
    num_nodes: usize,
    values: &mut [i32],
    names: &mut LabelNames,
    colors: &mut ColorTable,
) -> Result<()> {
    let name = label_name_from_path(path);
    let label = names.index_of(&name);
    if !colors.contains(&name) {
        colors.ensure(&name);
    }

    let content = read_text(path)?;
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'));

    let (count_line_no, count_line) = lines
        .next()
        .ok_or_else(|| Error::format(path, 0, "label file has no vertex count"))?;
    let declared: usize = count_line.trim().parse().map_err(|_| {
        Error::format(path, count_line_no as u64 + 1, "malformed vertex count")
    })?;

    let mut seen = 0usize;
    for (lineno, line) in lines {
        let fields = text::tokenize(line);
        let vertex: usize = fields
            .first()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| Error::format(path, lineno as u64 + 1, "malformed vertex index"))?;
        if vertex >= num_nodes {
            return Err(Error::format(
                path,
                lineno as u64 + 1,
                format!("label for vertex {} but the surface has {}", vertex, num_nodes),
            ));
        }
        values[vertex] = label;
        seen += 1;
    }
    if seen != declared {
        warn!(
            path = %path.display(),
            declared,
            seen,
            "label file vertex count disagrees with its rows"
        );
    }
    Ok(())
}

/// Region name from a label file name: the text between the first `-`
/// and the final `.`, or the whole base name.
fn label_name_from_path(path: &Path) -> String {
    let base = basename(path);
    match (base.find('-'), base.rfind('.')) {
        (Some(dash), Some(dot)) if dot > dash + 1 => base[dash + 1..dot].to_string(),
        _ => base,
    }
}

//! Importers that adapt foreign per-vertex formats into native columns.
//!
//! Each importer appends one column to the destination table (sizing an
//! empty table from the vertex count), names it after the imported
//! file, and records the import in the file comment.

mod contour;
mod curvature;
mod label;
mod suma;
mod vtk;
pub mod volume;

pub use contour::{import_md_plot, import_neurolucida, Contour, ContourSet};
pub use curvature::{import_curvature, import_functional};
pub use label::{import_label_file, LabelNames};
pub use suma::import_suma_rgb;
pub use vtk::import_vtk_point_data;

use std::fs;
use std::path::Path;

use crate::util::{Error, Result};

/// On-disk form of a foreign file that exists in both encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFormat {
    Ascii,
    Binary,
}

/// Read a whole text file, mapping a missing file to [`Error::FileNotFound`].
pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| map_not_found(e, path))
}

/// Read a whole binary file, mapping a missing file to [`Error::FileNotFound`].
pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| map_not_found(e, path))
}

fn map_not_found(e: std::io::Error, path: &Path) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::FileNotFound(path.to_path_buf())
    } else {
        Error::Io(e)
    }
}

/// File name without its directory, used to name imported columns.
pub(crate) fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

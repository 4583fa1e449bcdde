//! Filter routing and the named table registry.
//!
//! The outer application opens files through one entry point: a filter
//! selects the table kind, the file is read into a staging table, and
//! the staging table is merged into the registry's instance for that
//! kind (appended, or replacing the previous contents).

use std::path::{Path, PathBuf};

use tracing::info;

use crate::codec::{self, ReadMode};
use crate::color::ColorTable;
use crate::import::LabelNames;
use crate::merge::{merge, MergePlan};
use crate::table::{
    ArealEstimationTable, AttrTable, Cell, GeodesicTable, LatLonTable, MetricTable, PaintTable,
    RgbPaintTable, ShapeTable, SurfaceVectorTable, TableKind,
};
use crate::util::{Error, Result};

/// File-type filter chosen by the caller (usually from a chooser UI).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFilter {
    Paint,
    Metric,
    SurfaceShape,
    RgbPaint,
    LatLon,
    ArealEstimation,
    Geodesic,
    SurfaceVector,
}

impl FileFilter {
    pub const fn kind(self) -> TableKind {
        match self {
            FileFilter::Paint => TableKind::Paint,
            FileFilter::Metric => TableKind::Metric,
            FileFilter::SurfaceShape => TableKind::Shape,
            FileFilter::RgbPaint => TableKind::RgbPaint,
            FileFilter::LatLon => TableKind::LatLon,
            FileFilter::ArealEstimation => TableKind::ArealEstimation,
            FileFilter::Geodesic => TableKind::Geodesic,
            FileFilter::SurfaceVector => TableKind::SurfaceVector,
        }
    }

    /// Filter for a path, by extension.
    pub fn from_path(path: &Path) -> Option<FileFilter> {
        let kind = TableKind::from_path(path.to_str()?)?;
        Some(match kind {
            TableKind::Paint => FileFilter::Paint,
            TableKind::Metric => FileFilter::Metric,
            TableKind::Shape => FileFilter::SurfaceShape,
            TableKind::RgbPaint => FileFilter::RgbPaint,
            TableKind::LatLon => FileFilter::LatLon,
            TableKind::ArealEstimation => FileFilter::ArealEstimation,
            TableKind::Geodesic => FileFilter::Geodesic,
            TableKind::SurfaceVector => FileFilter::SurfaceVector,
        })
    }
}

/// How an open folds into the registry's existing table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenOptions {
    /// Append the file's columns to the existing table instead of
    /// replacing it.
    pub append: bool,
    /// Record the opened path for later session-spec writing.
    pub update_spec: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            append: true,
            update_spec: false,
        }
    }
}

/// Advisory signals from a successful open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenOutcome {
    /// The loaded file references colors by name but the registry's
    /// color table is empty.
    pub empty_color_table: bool,
}

/// The in-memory destination tables, one per kind, addressed by the
/// kind's registry key.
#[derive(Clone, Debug, Default)]
pub struct TableRegistry {
    pub paint: PaintTable,
    pub metric: MetricTable,
    pub shape: ShapeTable,
    pub rgb_paint: RgbPaintTable,
    pub lat_lon: LatLonTable,
    pub areal_estimation: ArealEstimationTable,
    pub geodesic: GeodesicTable,
    pub surface_vector: SurfaceVectorTable,
    /// Area colors referenced by paint labels.
    pub colors: ColorTable,
    /// Label names referenced by paint cells.
    pub labels: LabelNames,
    /// Paths recorded for session-spec writing.
    spec_files: Vec<(TableKind, PathBuf)>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths recorded by opens with `update_spec` set.
    pub fn spec_files(&self) -> &[(TableKind, PathBuf)] {
        &self.spec_files
    }

    /// Resolve a registry key (e.g. `paint-file`) to its kind.
    pub fn kind_for_key(key: &str) -> Option<TableKind> {
        TableKind::ALL.iter().copied().find(|k| k.registry_key() == key)
    }
}

/// Open a data file and fold it into the registry.
///
/// Without `append` the previous contents of the destination table are
/// discarded. The returned outcome carries the empty-color-table
/// advisory; it never fails the load.
pub fn open_data_file(
    registry: &mut TableRegistry,
    filter: FileFilter,
    path: impl AsRef<Path>,
    options: OpenOptions,
) -> Result<OpenOutcome> {
    let path = path.as_ref();
    let kind = filter.kind();
    match filter {
        FileFilter::Paint => open_into(&mut registry.paint, kind, path, options.append)?,
        FileFilter::Metric => open_into(&mut registry.metric, kind, path, options.append)?,
        FileFilter::SurfaceShape => open_into(&mut registry.shape, kind, path, options.append)?,
        FileFilter::RgbPaint => open_into(&mut registry.rgb_paint, kind, path, options.append)?,
        FileFilter::LatLon => open_into(&mut registry.lat_lon, kind, path, options.append)?,
        FileFilter::ArealEstimation => {
            open_into(&mut registry.areal_estimation, kind, path, options.append)?
        }
        FileFilter::Geodesic => open_into(&mut registry.geodesic, kind, path, options.append)?,
        FileFilter::SurfaceVector => {
            open_into(&mut registry.surface_vector, kind, path, options.append)?
        }
    }
    if options.update_spec {
        registry.spec_files.push((kind, path.to_path_buf()));
    }

    // Paint labels resolve their colors by name; an empty color table
    // means everything would render unassigned.
    let empty_color_table = matches!(
        filter,
        FileFilter::Paint | FileFilter::ArealEstimation
    ) && registry.colors.is_empty();

    info!(
        path = %path.display(),
        kind = kind.name(),
        append = options.append,
        empty_color_table,
        "opened data file"
    );
    Ok(OpenOutcome { empty_color_table })
}

/// Read a staging table and merge it into the destination.
fn open_into<C: Cell>(
    dest: &mut AttrTable<C>,
    kind: TableKind,
    path: &Path,
    append: bool,
) -> Result<()> {
    let staged: AttrTable<C> = codec::read_table(path, kind, ReadMode::Full)?;
    if append {
        merge(&staged, dest, &MergePlan::new())
    } else {
        dest.clear();
        merge(&staged, dest, &MergePlan::new().erase_all())
    }
}

/// Translate an error into the user-facing message shown by the outer
/// application, with the originating path.
pub fn open_failure_message(path: &Path, error: &Error) -> String {
    format!("Unable to open {}: {}", path.display(), error)
}

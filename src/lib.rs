//! # surfattr
//!
//! Per-vertex attribute file engine for cortical surface analysis data.
//!
//! A surface mesh has `N` vertices ("nodes"); an attribute table carries one
//! or more named columns of per-vertex values together with column metadata
//! (names, comments, study provenance links, RGB scaling) and a file-level
//! header tag map. Tables are persisted in several historical on-disk
//! encodings (tagged ASCII, raw binary, XML, CSV, plus legacy headerless
//! RGB forms) and composed by a column-wise merge protocol.
//!
//! ## Modules
//!
//! - [`util`] - Errors, text helpers, progress/cancel probes
//! - [`table`] - The generic attribute table, cell types, column metadata
//! - [`codec`] - Multi-format serializer/deserializer
//! - [`merge`] - Column-wise append/overwrite/skip merge engine
//! - [`deform`] - Re-sampling through a vertex correspondence map
//! - [`import`] - Foreign-format importers (FreeSurfer, SUMA, VTK, ...)
//! - [`color`] - Name-keyed color table with deterministic synthesis
//! - [`foci`] - Foci-uncertainty to RGB derivation
//! - [`dispatch`] - Filter routing and the named table registry
//!
//! ## Example
//!
//! ```ignore
//! use surfattr::prelude::*;
//!
//! let metric: MetricTable = codec::read_table("depth.metric", TableKind::Metric, ReadMode::Full)?;
//! println!("{} nodes, {} columns", metric.num_nodes(), metric.num_columns());
//! ```

pub mod util;
pub mod table;
pub mod codec;
pub mod merge;
pub mod deform;
pub mod color;
pub mod surface;
pub mod import;
pub mod foci;
pub mod dispatch;

// Re-export commonly used types
pub use util::{Error, Result};
pub use table::{AttrTable, Cell, TableKind};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, ProgressProbe};
    pub use crate::table::{
        ArealCell, ArealEstimationTable, AttrTable, Cell, GeodesicCell, GeodesicTable, LatLon,
        LatLonTable, MetricTable, PaintTable, Rgb, RgbPaintTable, ShapeTable, SurfaceVectorTable,
        TableKind,
    };
    pub use crate::codec::{self, Encoding, ReadMode};
    pub use crate::merge::{merge, ColumnAction, CommentMode, MergePlan};
    pub use crate::deform::{deform, DeformMode, DeformationMap, TileEntry};
    pub use crate::color::ColorTable;
    pub use crate::dispatch::{open_data_file, FileFilter, OpenOptions, TableRegistry};
}

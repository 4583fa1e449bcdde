//! The attribute-table data model.
//!
//! - [`AttrTable`] - the generic column-oriented per-vertex container
//! - [`Cell`] - the per-kind cell type seam
//! - [`ColumnMetadata`] - name, comment, study links, channel scaling
//! - [`HeaderTags`] - the file-level header tag map
//! - [`TableKind`] - extensions, registry keys, encoding capabilities

mod cell;
mod column;
mod header;
mod kind;
mod table;

pub use cell::{ArealCell, Cell, GeodesicCell, LatLon, Rgb};
pub use column::{
    links_from_coded_text, links_to_coded_text, Channel, ChannelMeta, ColumnMetadata, Scale,
    StudyLink, StudyLinkSet,
};
pub use header::HeaderTags;
pub use kind::TableKind;
pub use table::AttrTable;

/// Paint table: one `i32` label index per vertex per column.
pub type PaintTable = AttrTable<i32>;
/// Metric table: one `f32` per vertex per column.
pub type MetricTable = AttrTable<f32>;
/// Surface shape table: same cell shape as metric, separate kind.
pub type ShapeTable = AttrTable<f32>;
/// RGB paint table.
pub type RgbPaintTable = AttrTable<Rgb>;
/// Latitude/longitude table.
pub type LatLonTable = AttrTable<LatLon>;
/// Areal estimation table.
pub type ArealEstimationTable = AttrTable<ArealCell>;
/// Geodesic distance table.
pub type GeodesicTable = AttrTable<GeodesicCell>;
/// Surface vector table.
pub type SurfaceVectorTable = AttrTable<glam::Vec3>;

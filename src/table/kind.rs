//! Table kinds: extensions, registry keys, encoding capabilities.

use crate::codec::Encoding;

/// The concrete attribute-table kinds.
///
/// A kind fixes the cell type, the file extension the outer dispatcher
/// filters on, the registry key addressing the in-memory instance, and
/// which on-disk encodings the codec accepts for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    Paint,
    Metric,
    Shape,
    RgbPaint,
    LatLon,
    ArealEstimation,
    Geodesic,
    SurfaceVector,
}

impl TableKind {
    pub const ALL: [TableKind; 8] = [
        TableKind::Paint,
        TableKind::Metric,
        TableKind::Shape,
        TableKind::RgbPaint,
        TableKind::LatLon,
        TableKind::ArealEstimation,
        TableKind::Geodesic,
        TableKind::SurfaceVector,
    ];

    /// Stable file extension, with the leading dot.
    pub const fn extension(self) -> &'static str {
        match self {
            TableKind::Paint => ".paint",
            TableKind::Metric => ".metric",
            TableKind::Shape => ".surface_shape",
            TableKind::RgbPaint => ".RGB_paint",
            TableKind::LatLon => ".latlon",
            TableKind::ArealEstimation => ".areal_estimation",
            TableKind::Geodesic => ".geodesic",
            TableKind::SurfaceVector => ".surface_vector",
        }
    }

    /// Fixed string key addressing the in-memory instance in a registry.
    pub const fn registry_key(self) -> &'static str {
        match self {
            TableKind::Paint => "paint-file",
            TableKind::Metric => "metric-file",
            TableKind::Shape => "surface-shape-file",
            TableKind::RgbPaint => "rgb-paint-file",
            TableKind::LatLon => "latlon-file",
            TableKind::ArealEstimation => "areal-estimation-file",
            TableKind::Geodesic => "geodesic-distance-file",
            TableKind::SurfaceVector => "surface-vector-file",
        }
    }

    /// Display name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            TableKind::Paint => "paint",
            TableKind::Metric => "metric",
            TableKind::Shape => "surface shape",
            TableKind::RgbPaint => "RGB paint",
            TableKind::LatLon => "lat/lon",
            TableKind::ArealEstimation => "areal estimation",
            TableKind::Geodesic => "geodesic distance",
            TableKind::SurfaceVector => "surface vector",
        }
    }

    /// Whether this kind carries the RGB channel tags
    /// (titles/comments/scales) in the tagged grammar.
    pub const fn has_rgb_channels(self) -> bool {
        matches!(self, TableKind::RgbPaint)
    }

    /// Whether the headerless legacy version-0 parser applies.
    pub const fn has_legacy_version0(self) -> bool {
        matches!(self, TableKind::RgbPaint)
    }

    /// Encoding capability matrix. Tagged ASCII and binary are
    /// universal; XML and CSV are opt-in per kind.
    pub const fn supports(self, encoding: Encoding) -> bool {
        match encoding {
            Encoding::TaggedAscii | Encoding::TaggedBinary => true,
            Encoding::Xml => matches!(
                self,
                TableKind::Paint | TableKind::Metric | TableKind::Shape
            ),
            Encoding::Csv => matches!(self, TableKind::Metric | TableKind::Shape),
        }
    }

    /// Find the kind whose extension terminates the file name.
    pub fn from_path(path: &str) -> Option<TableKind> {
        TableKind::ALL
            .into_iter()
            .find(|kind| path.ends_with(kind.extension()))
    }
}

//! Re-sample an attribute table through a vertex correspondence map.
//!
//! A deformation map pairs each destination vertex with a triangle of
//! source vertices and barycentric weights. Nearest-node mode takes
//! the first tile corner; tile-average mode combines all three through
//! [`Cell::interpolate`], so numeric columns blend and label columns
//! take the dominant corner.

use tracing::debug;

use crate::table::{AttrTable, Cell};
use crate::util::{Error, Result};

/// One destination vertex's correspondence record.
///
/// `tile_nodes[0] == -1` marks a destination vertex with no source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileEntry {
    pub tile_nodes: [i32; 3],
    pub tile_weights: [f32; 3],
}

impl TileEntry {
    /// The no-source sentinel.
    pub const NONE: TileEntry = TileEntry {
        tile_nodes: [-1, -1, -1],
        tile_weights: [0.0; 3],
    };

    pub fn new(tile_nodes: [i32; 3], tile_weights: [f32; 3]) -> Self {
        Self { tile_nodes, tile_weights }
    }

    /// A degenerate tile that maps straight to one source vertex.
    pub fn node(source: i32) -> Self {
        Self {
            tile_nodes: [source, source, source],
            tile_weights: [1.0, 0.0, 0.0],
        }
    }

    #[inline]
    pub fn has_source(&self) -> bool {
        self.tile_nodes[0] >= 0
    }
}

/// Precomputed vertex correspondence from a source surface to a
/// destination surface. One entry per destination vertex.
#[derive(Clone, Debug, Default)]
pub struct DeformationMap {
    /// Vertex count of the source surface the map was built against.
    source_nodes: usize,
    entries: Vec<TileEntry>,
    /// Provenance label recorded on deformed tables (usually the map
    /// file's name).
    pub name: String,
}

impl DeformationMap {
    pub fn new(source_nodes: usize, entries: Vec<TileEntry>) -> Self {
        Self {
            source_nodes,
            entries,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Map every vertex of an `n`-vertex surface to itself.
    pub fn identity(n: usize) -> Self {
        let entries = (0..n).map(|v| TileEntry::node(v as i32)).collect();
        Self::new(n, entries)
    }

    #[inline]
    pub fn source_nodes(&self) -> usize {
        self.source_nodes
    }

    /// Destination vertex count.
    #[inline]
    pub fn target_nodes(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn entries(&self) -> &[TileEntry] {
        &self.entries
    }
}

/// How a destination cell samples its source tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeformMode {
    /// First tile corner only.
    NearestNode,
    /// Barycentric combination of all three corners.
    #[default]
    TileAverage,
}

/// Produce a new table indexed by the map's destination surface.
///
/// File-level metadata and column metadata are copied verbatim; a
/// provenance line is appended to the file comment when the map is
/// named. Destination vertices without a source get the cell type's
/// zero value.
pub fn deform<C: Cell>(
    source: &AttrTable<C>,
    map: &DeformationMap,
    mode: DeformMode,
) -> Result<AttrTable<C>> {
    if map.source_nodes() != source.num_nodes() {
        return Err(Error::shape(source.num_nodes(), map.source_nodes()));
    }
    for entry in map.entries() {
        for &n in &entry.tile_nodes {
            if n >= source.num_nodes() as i32 {
                return Err(Error::PolicyViolation(format!(
                    "deformation map references source vertex {} of {}",
                    n,
                    source.num_nodes()
                )));
            }
        }
    }

    let mut dest: AttrTable<C> = AttrTable::with_size(map.target_nodes(), source.num_columns());
    dest.title = source.title.clone();
    dest.header = source.header.clone();
    for c in 0..source.num_columns() {
        *dest.column_mut(c) = source.column(c).clone();
    }
    if !map.name.is_empty() {
        let line = format!("Deformed with: {}", map.name);
        if dest.file_comment().is_empty() {
            dest.set_file_comment(line);
        } else {
            dest.append_file_comment(&format!("\n{}", line));
        }
    }

    for (v, entry) in map.entries().iter().enumerate() {
        if !entry.has_source() {
            continue; // with_size zero-filled the row
        }
        for c in 0..source.num_columns() {
            let value = match mode {
                DeformMode::NearestNode => source.cell(entry.tile_nodes[0] as usize, c),
                DeformMode::TileAverage => {
                    let corners = entry.tile_nodes.map(|n| {
                        if n >= 0 {
                            source.cell(n as usize, c)
                        } else {
                            C::default()
                        }
                    });
                    C::interpolate(corners, entry.tile_nodes, entry.tile_weights)
                }
            };
            dest.set_cell(v, c, value);
        }
    }
    debug!(
        source_nodes = source.num_nodes(),
        target_nodes = dest.num_nodes(),
        columns = dest.num_columns(),
        ?mode,
        "deformation transfer complete"
    );
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> AttrTable<f32> {
        let mut t: AttrTable<f32> = AttrTable::with_size(4, 2);
        t.title = "src".to_string();
        t.set_file_comment("original");
        t.column_mut(0).name = "a".to_string();
        t.column_mut(1).name = "b".to_string();
        for v in 0..4 {
            t.set_cell(v, 0, v as f32);
            t.set_cell(v, 1, v as f32 * 100.0);
        }
        t
    }

    #[test]
    fn test_identity_map_preserves_cells() {
        let src = source();
        let map = DeformationMap::identity(4);
        let out = deform(&src, &map, DeformMode::TileAverage).unwrap();
        assert_eq!(out.num_nodes(), 4);
        for v in 0..4 {
            assert_eq!(out.cell(v, 0), src.cell(v, 0));
            assert_eq!(out.cell(v, 1), src.cell(v, 1));
        }
        assert_eq!(out.column(0).name, "a");
        assert_eq!(out.title, "src");
    }

    #[test]
    fn test_tile_average_blends() {
        let src = source();
        let map = DeformationMap::new(
            4,
            vec![TileEntry::new([0, 1, 2], [0.5, 0.25, 0.25])],
        );
        let out = deform(&src, &map, DeformMode::TileAverage).unwrap();
        assert_eq!(out.num_nodes(), 1);
        assert_eq!(out.cell(0, 0), 0.0 * 0.5 + 1.0 * 0.25 + 2.0 * 0.25);
    }

    #[test]
    fn test_nearest_node_takes_first_corner() {
        let src = source();
        let map = DeformationMap::new(
            4,
            vec![TileEntry::new([3, 1, 2], [0.1, 0.5, 0.4])],
        );
        let out = deform(&src, &map, DeformMode::NearestNode).unwrap();
        assert_eq!(out.cell(0, 0), 3.0);
    }

    #[test]
    fn test_sentinel_yields_zero() {
        let src = source();
        let map = DeformationMap::new(4, vec![TileEntry::NONE, TileEntry::node(2)]);
        let out = deform(&src, &map, DeformMode::TileAverage).unwrap();
        assert_eq!(out.cell(0, 0), 0.0);
        assert_eq!(out.cell(1, 0), 2.0);
    }

    #[test]
    fn test_label_takes_dominant_weight() {
        let mut src: AttrTable<i32> = AttrTable::with_size(3, 1);
        src.set_cell(0, 0, 7);
        src.set_cell(1, 0, 8);
        src.set_cell(2, 0, 9);
        let map = DeformationMap::new(
            3,
            vec![
                TileEntry::new([0, 1, 2], [0.2, 0.5, 0.3]),
                // tie between corners 0 and 2; smaller vertex index wins
                TileEntry::new([2, 1, 0], [0.4, 0.2, 0.4]),
            ],
        );
        let out = deform(&src, &map, DeformMode::TileAverage).unwrap();
        assert_eq!(out.cell(0, 0), 8);
        assert_eq!(out.cell(1, 0), 7);
    }

    #[test]
    fn test_source_count_mismatch() {
        let src = source();
        let map = DeformationMap::new(9, vec![TileEntry::node(0)]);
        assert!(matches!(
            deform(&src, &map, DeformMode::TileAverage),
            Err(crate::util::Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_provenance_comment() {
        let src = source();
        let map = DeformationMap::identity(4).with_name("left.deform_map");
        let out = deform(&src, &map, DeformMode::NearestNode).unwrap();
        assert_eq!(out.file_comment(), "original\nDeformed with: left.deform_map");
    }
}

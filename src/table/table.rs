//! The generic per-vertex attribute table.

use std::collections::BTreeSet;

use super::cell::Cell;
use super::column::ColumnMetadata;
use super::header::HeaderTags;
use crate::util::{Error, Result};

/// Column-oriented per-vertex container of fixed node count `N` and a
/// variable column count.
///
/// Cells are stored vertex-major: cell `(v, c)` lives at `v * C + c`.
/// Every public mutator maintains the table invariants: all columns have
/// exactly `N` cells and the metadata vector length equals the column
/// count.
///
/// A table produced by a metadata-only read carries node and column
/// counts plus metadata but no cell storage; [`AttrTable::has_data`]
/// distinguishes the two states.
#[derive(Clone, Debug, PartialEq)]
pub struct AttrTable<C: Cell> {
    num_nodes: usize,
    num_columns: usize,
    cells: Vec<C>,
    columns: Vec<ColumnMetadata>,
    /// File title (`tag-title`).
    pub title: String,
    /// File-level header tag map, including the file comment.
    pub header: HeaderTags,
    data_allocated: bool,
}

impl<C: Cell> Default for AttrTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Cell> AttrTable<C> {
    /// Create an empty table (`N = 0`, zero columns).
    pub fn new() -> Self {
        Self {
            num_nodes: 0,
            num_columns: 0,
            cells: Vec::new(),
            columns: Vec::new(),
            title: String::new(),
            header: HeaderTags::new(),
            data_allocated: false,
        }
    }

    /// Create a zero-filled table of the given shape.
    pub fn with_size(num_nodes: usize, num_columns: usize) -> Self {
        let mut table = Self::new();
        // set_size on an empty table cannot fail
        table.set_size(num_nodes, num_columns).expect("empty table");
        table
    }

    /// Number of vertices `N`.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of columns `C`.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// True when `N == 0`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_nodes == 0
    }

    /// True when cell storage is allocated (false after a
    /// metadata-only read).
    #[inline]
    pub fn has_data(&self) -> bool {
        self.data_allocated
    }

    /// Restore the empty state, releasing all cell and column storage.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Resize to `N × C`, zero-initializing newly created cells.
    ///
    /// Growing or shrinking the column count preserves overlapping
    /// columns. Changing `N` on a non-empty table fails with
    /// `ShapeMismatch`; callers clear first.
    pub fn set_size(&mut self, num_nodes: usize, num_columns: usize) -> Result<()> {
        if num_nodes == 0 || num_columns == 0 {
            self.clear();
            return Ok(());
        }
        if self.num_nodes > 0 && num_nodes != self.num_nodes {
            return Err(Error::shape(self.num_nodes, num_nodes));
        }

        let mut cells = vec![C::default(); num_nodes * num_columns];
        if self.data_allocated {
            let keep = self.num_columns.min(num_columns);
            for v in 0..self.num_nodes.min(num_nodes) {
                for c in 0..keep {
                    cells[v * num_columns + c] = self.cells[v * self.num_columns + c];
                }
            }
        }
        self.cells = cells;
        self.columns.resize_with(num_columns, ColumnMetadata::default);
        self.num_nodes = num_nodes;
        self.num_columns = num_columns;
        self.data_allocated = true;
        Ok(())
    }

    /// Establish shape and metadata without allocating cell storage.
    /// Used by the codec's metadata-only fast path.
    pub(crate) fn set_size_metadata_only(&mut self, num_nodes: usize, num_columns: usize) {
        self.num_nodes = num_nodes;
        self.num_columns = num_columns;
        self.cells = Vec::new();
        self.columns.resize_with(num_columns, ColumnMetadata::default);
        self.data_allocated = false;
    }

    /// Append `k` zero-filled columns.
    ///
    /// An empty table takes its node count from `num_nodes`; otherwise
    /// `num_nodes`, when given, must match the current `N`.
    pub fn add_columns(&mut self, k: usize, num_nodes: Option<usize>) -> Result<()> {
        if self.is_empty() {
            let n = num_nodes.ok_or_else(|| Error::shape(0, 0))?;
            return self.set_size(n, k);
        }
        if let Some(n) = num_nodes {
            if n != self.num_nodes {
                return Err(Error::shape(self.num_nodes, n));
            }
        }
        self.set_size(self.num_nodes, self.num_columns + k)
    }

    /// Grow `N` by `k`, zero-initializing new rows across all columns.
    pub fn add_nodes(&mut self, k: usize) {
        if k == 0 || self.num_columns == 0 {
            return;
        }
        self.num_nodes += k;
        self.cells
            .resize(self.num_nodes * self.num_columns, C::default());
        self.data_allocated = true;
    }

    /// Delete column `i` with its metadata; higher columns shift down.
    /// Removing the last remaining column clears the table.
    pub fn remove_column(&mut self, i: usize) -> Result<()> {
        self.check_column(i)?;
        if self.num_columns == 1 {
            self.clear();
            return Ok(());
        }
        let new_columns = self.num_columns - 1;
        let mut cells = Vec::with_capacity(self.num_nodes * new_columns);
        for v in 0..self.num_nodes {
            for c in 0..self.num_columns {
                if c != i {
                    cells.push(self.cells[v * self.num_columns + c]);
                }
            }
        }
        self.cells = cells;
        self.columns.remove(i);
        self.num_columns = new_columns;
        Ok(())
    }

    /// Zero the cells of column `i` and reset its metadata to defaults.
    pub fn reset_column(&mut self, i: usize) -> Result<()> {
        self.check_column(i)?;
        for v in 0..self.num_nodes {
            self.cells[v * self.num_columns + i] = C::default();
        }
        self.columns[i].reset();
        Ok(())
    }

    /// Read cell `(node, column)`.
    ///
    /// Panics when out of bounds or on a metadata-only table; shape is
    /// an invariant, not an input.
    #[inline]
    pub fn cell(&self, node: usize, column: usize) -> C {
        self.cells[node * self.num_columns + column]
    }

    /// Write cell `(node, column)`. Panics like [`AttrTable::cell`].
    #[inline]
    pub fn set_cell(&mut self, node: usize, column: usize, value: C) {
        self.cells[node * self.num_columns + column] = value;
    }

    /// Metadata of column `i`.
    pub fn column(&self, i: usize) -> &ColumnMetadata {
        &self.columns[i]
    }

    /// Mutable metadata of column `i`.
    pub fn column_mut(&mut self, i: usize) -> &mut ColumnMetadata {
        &mut self.columns[i]
    }

    /// All column metadata records.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// File comment (display form), from the header tag map.
    pub fn file_comment(&self) -> &str {
        self.header.get(HeaderTags::COMMENT_KEY).unwrap_or("")
    }

    /// Replace the file comment.
    pub fn set_file_comment(&mut self, comment: impl Into<String>) {
        self.header.set(HeaderTags::COMMENT_KEY, comment);
    }

    /// Append text to the file comment.
    pub fn append_file_comment(&mut self, text: &str) {
        let mut comment = self.file_comment().to_string();
        comment.push_str(text);
        self.set_file_comment(comment);
    }

    /// Copy the cells of column `i` out of the table.
    pub fn column_cells(&self, i: usize) -> Vec<C> {
        (0..self.num_nodes).map(|v| self.cell(v, i)).collect()
    }

    /// Append a column from cells and metadata. The cell count must
    /// equal `N` (or establish `N` on an empty table).
    pub fn push_column(&mut self, cells: &[C], meta: ColumnMetadata) -> Result<()> {
        if self.is_empty() {
            self.set_size(cells.len(), 1)?;
        } else {
            if cells.len() != self.num_nodes {
                return Err(Error::shape(self.num_nodes, cells.len()));
            }
            self.add_columns(1, None)?;
        }
        let i = self.num_columns - 1;
        for (v, &cell) in cells.iter().enumerate() {
            self.set_cell(v, i, cell);
        }
        self.columns[i] = meta;
        Ok(())
    }

    /// Overwrite column `i` in place with cells and metadata.
    pub fn overwrite_column(&mut self, i: usize, cells: &[C], meta: ColumnMetadata) -> Result<()> {
        self.check_column(i)?;
        if cells.len() != self.num_nodes {
            return Err(Error::shape(self.num_nodes, cells.len()));
        }
        for (v, &cell) in cells.iter().enumerate() {
            self.set_cell(v, i, cell);
        }
        self.columns[i] = meta;
        Ok(())
    }

    /// Resolve a column reference: a 1-based column number string or an
    /// exact (case-sensitive) column name.
    ///
    /// When `append_if_missing` is set, a non-numeric unknown name
    /// appends a new zero-filled column carrying that name and returns
    /// its index. Otherwise fails with `NoSuchColumn`.
    pub fn resolve_column(&mut self, reference: &str, append_if_missing: bool) -> Result<usize> {
        if let Ok(number) = reference.trim().parse::<usize>() {
            // Public refs are 1-based; internal indices are 0-based.
            if number >= 1 && number <= self.num_columns {
                return Ok(number - 1);
            }
            return Err(Error::NoSuchColumn(reference.to_string()));
        }
        if let Some(i) = self.columns.iter().position(|m| m.name == reference) {
            return Ok(i);
        }
        if append_if_missing && !self.is_empty() {
            self.add_columns(1, None)?;
            let i = self.num_columns - 1;
            self.columns[i].name = reference.to_string();
            return Ok(i);
        }
        Err(Error::NoSuchColumn(reference.to_string()))
    }

    /// Names that occur on more than one column, in first-seen order.
    pub fn find_duplicate_names(&self) -> Vec<String> {
        let mut duplicates = Vec::new();
        for (i, meta) in self.columns.iter().enumerate() {
            if meta.name.is_empty() {
                continue;
            }
            let first = self.columns.iter().position(|m| m.name == meta.name);
            if first == Some(i) {
                let count = self.columns.iter().filter(|m| m.name == meta.name).count();
                if count > 1 {
                    duplicates.push(meta.name.clone());
                }
            }
        }
        duplicates
    }

    /// Union of PubMed identifiers across all column study-link sets.
    /// Computed on query, never stored.
    pub fn all_pubmed_ids(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        for meta in &self.columns {
            for link in &meta.study_links {
                if !link.pubmed_id.is_empty() {
                    ids.insert(link.pubmed_id.clone());
                }
            }
        }
        ids
    }

    fn check_column(&self, i: usize) -> Result<()> {
        if i < self.num_columns {
            Ok(())
        } else {
            Err(Error::NoSuchColumn(format!("{}", i + 1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::cell::Rgb;

    #[test]
    fn test_empty_table() {
        let table: AttrTable<f32> = AttrTable::new();
        assert!(table.is_empty());
        assert_eq!(table.num_nodes(), 0);
        assert_eq!(table.num_columns(), 0);
        assert!(!table.has_data());
    }

    #[test]
    fn test_with_size_zero_fills() {
        let table: AttrTable<f32> = AttrTable::with_size(4, 2);
        assert_eq!(table.num_nodes(), 4);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.columns().len(), 2);
        for v in 0..4 {
            for c in 0..2 {
                assert_eq!(table.cell(v, c), 0.0);
            }
        }
    }

    #[test]
    fn test_set_size_rejects_node_change() {
        let mut table: AttrTable<f32> = AttrTable::with_size(4, 1);
        assert!(matches!(
            table.set_size(5, 1),
            Err(Error::ShapeMismatch { expected: 4, actual: 5 })
        ));
        // Clearing first makes it legal.
        table.clear();
        assert!(table.set_size(5, 1).is_ok());
    }

    #[test]
    fn test_grow_columns_preserves_overlap() {
        let mut table: AttrTable<f32> = AttrTable::with_size(3, 1);
        for v in 0..3 {
            table.set_cell(v, 0, v as f32 + 1.0);
        }
        table.column_mut(0).name = "first".to_string();
        table.add_columns(2, None).unwrap();
        assert_eq!(table.num_columns(), 3);
        for v in 0..3 {
            assert_eq!(table.cell(v, 0), v as f32 + 1.0);
            assert_eq!(table.cell(v, 1), 0.0);
            assert_eq!(table.cell(v, 2), 0.0);
        }
        assert_eq!(table.column(0).name, "first");
    }

    #[test]
    fn test_add_columns_shape_check() {
        let mut table: AttrTable<f32> = AttrTable::with_size(3, 1);
        assert!(table.add_columns(1, Some(3)).is_ok());
        assert!(matches!(
            table.add_columns(1, Some(7)),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_add_nodes() {
        let mut table: AttrTable<i32> = AttrTable::with_size(2, 2);
        table.set_cell(1, 1, 9);
        table.add_nodes(3);
        assert_eq!(table.num_nodes(), 5);
        assert_eq!(table.cell(1, 1), 9);
        assert_eq!(table.cell(4, 1), 0);
    }

    #[test]
    fn test_remove_column_shifts_down() {
        let mut table: AttrTable<i32> = AttrTable::with_size(2, 3);
        for c in 0..3 {
            table.column_mut(c).name = format!("col{}", c);
            table.set_cell(0, c, c as i32 * 10);
        }
        table.remove_column(1).unwrap();
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.column(0).name, "col0");
        assert_eq!(table.column(1).name, "col2");
        assert_eq!(table.cell(0, 1), 20);
    }

    #[test]
    fn test_remove_last_column_clears() {
        let mut table: AttrTable<f32> = AttrTable::with_size(4, 1);
        table.remove_column(0).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn test_remove_then_add_restores_shape() {
        let mut table: AttrTable<f32> = AttrTable::with_size(4, 2);
        table.set_cell(2, 1, 5.0);
        table.remove_column(1).unwrap();
        table.add_columns(1, None).unwrap();
        assert_eq!(table.num_nodes(), 4);
        assert_eq!(table.num_columns(), 2);
        for v in 0..4 {
            assert_eq!(table.cell(v, 1), 0.0);
        }
    }

    #[test]
    fn test_reset_column() {
        let mut table: AttrTable<Rgb> = AttrTable::with_size(2, 1);
        table.set_cell(0, 0, Rgb::new(1.0, 2.0, 3.0));
        table.column_mut(0).name = "x".to_string();
        table.reset_column(0).unwrap();
        assert_eq!(table.cell(0, 0), Rgb::default());
        assert!(table.column(0).name.is_empty());
        assert_eq!(table.num_columns(), 1);
    }

    #[test]
    fn test_resolve_column() {
        let mut table: AttrTable<f32> = AttrTable::with_size(3, 2);
        table.column_mut(0).name = "Depth".to_string();
        table.column_mut(1).name = "Curvature".to_string();

        // 1-based number refs
        assert_eq!(table.resolve_column("1", false).unwrap(), 0);
        assert_eq!(table.resolve_column("2", false).unwrap(), 1);
        assert!(table.resolve_column("3", false).is_err());
        assert!(table.resolve_column("0", false).is_err());

        // Exact names, case-sensitive
        assert_eq!(table.resolve_column("Curvature", false).unwrap(), 1);
        assert!(table.resolve_column("curvature", false).is_err());

        // Optional append of unknown names
        let i = table.resolve_column("New Column", true).unwrap();
        assert_eq!(i, 2);
        assert_eq!(table.column(2).name, "New Column");
    }

    #[test]
    fn test_find_duplicate_names() {
        let mut table: AttrTable<f32> = AttrTable::with_size(2, 4);
        table.column_mut(0).name = "a".to_string();
        table.column_mut(1).name = "b".to_string();
        table.column_mut(2).name = "a".to_string();
        table.column_mut(3).name = "b".to_string();
        assert_eq!(table.find_duplicate_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_pubmed_union_is_computed() {
        use crate::table::column::StudyLink;
        let mut table: AttrTable<f32> = AttrTable::with_size(2, 2);
        table
            .column_mut(0)
            .study_links
            .push(StudyLink::with_pubmed_id("111"));
        table
            .column_mut(1)
            .study_links
            .push(StudyLink::with_pubmed_id("222"));
        table
            .column_mut(1)
            .study_links
            .push(StudyLink::with_pubmed_id("111"));

        let ids: Vec<String> = table.all_pubmed_ids().into_iter().collect();
        assert_eq!(ids, vec!["111", "222"]);
    }

    #[test]
    fn test_file_comment_through_header() {
        let mut table: AttrTable<f32> = AttrTable::new();
        assert_eq!(table.file_comment(), "");
        table.set_file_comment("hello");
        table.append_file_comment("\nworld");
        assert_eq!(table.file_comment(), "hello\nworld");
    }
}

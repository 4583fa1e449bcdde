//! Column-wise merge of a freshly read table into an owned one.
//!
//! The caller reads an incoming file into a staging table, chooses a
//! per-column action (append, skip, or overwrite a destination
//! column), and the engine transfers cells plus metadata in one
//! validated pass. Nothing is mutated until the whole plan checks out.

use tracing::debug;

use crate::table::{AttrTable, Cell};
use crate::util::{Error, Result};

/// What to do with one source column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnAction {
    /// Append as a new destination column.
    New,
    /// Do not transfer.
    Skip,
    /// Overwrite destination column `d` in place.
    Overwrite(usize),
}

/// How the destination's file-level comment absorbs the source's.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommentMode {
    /// destination ← destination + "\n" + source
    #[default]
    Append,
    /// destination unchanged
    LeaveAsIs,
    /// destination ← source
    Replace,
}

/// A merge request. The default plan is a full append: every source
/// column becomes a new destination column, comment mode `Append`.
#[derive(Clone, Debug, Default)]
pub struct MergePlan {
    /// Per-source-column actions; `None` means all-`New`.
    pub actions: Option<Vec<ColumnAction>>,
    /// Per-source-column name overrides, applied before transfer.
    pub renames: Vec<Option<String>>,
    pub comment_mode: CommentMode,
    /// The caller is about to clear (or has cleared) the destination's
    /// original columns: overwrite actions are refused and the comment
    /// mode is forced to `Replace`.
    pub erase_all: bool,
}

impl MergePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actions(actions: Vec<ColumnAction>) -> Self {
        Self {
            actions: Some(actions),
            ..Self::default()
        }
    }

    /// Override the name of source column `i` before transfer.
    pub fn rename(mut self, i: usize, name: impl Into<String>) -> Self {
        if self.renames.len() <= i {
            self.renames.resize(i + 1, None);
        }
        self.renames[i] = Some(name.into());
        self
    }

    pub fn comment_mode(mut self, mode: CommentMode) -> Self {
        self.comment_mode = mode;
        self
    }

    pub fn erase_all(mut self) -> Self {
        self.erase_all = true;
        self
    }
}

/// Merge `source` into `dest` per `plan`.
///
/// An empty destination is first sized to the source's vertex count;
/// otherwise the counts must match. On any error the destination is
/// left untouched.
pub fn merge<C: Cell>(
    source: &AttrTable<C>,
    dest: &mut AttrTable<C>,
    plan: &MergePlan,
) -> Result<()> {
    let actions: Vec<ColumnAction> = match &plan.actions {
        Some(actions) => {
            if actions.len() != source.num_columns() {
                return Err(Error::shape(source.num_columns(), actions.len()));
            }
            actions.clone()
        }
        None => vec![ColumnAction::New; source.num_columns()],
    };

    if plan.erase_all {
        if actions.iter().any(|a| matches!(a, ColumnAction::Overwrite(_))) {
            return Err(Error::PolicyViolation(
                "overwrite actions are not allowed when erasing existing columns".to_string(),
            ));
        }
    }
    let comment_mode = if plan.erase_all {
        CommentMode::Replace
    } else {
        plan.comment_mode
    };

    if !dest.is_empty() && dest.num_nodes() != source.num_nodes() {
        return Err(Error::shape(dest.num_nodes(), source.num_nodes()));
    }
    if !source.is_empty() && !source.has_data() {
        return Err(Error::PolicyViolation(
            "source table was read without cell data".to_string(),
        ));
    }
    for action in &actions {
        if let ColumnAction::Overwrite(d) = action {
            if *d >= dest.num_columns() {
                return Err(Error::NoSuchColumn(format!("destination column {}", d)));
            }
        }
    }

    // Validation complete; mutate.
    if dest.is_empty() {
        dest.set_size(source.num_nodes(), 0)?;
    }

    match comment_mode {
        CommentMode::Append => {
            if !source.file_comment().is_empty() {
                if dest.file_comment().is_empty() {
                    dest.set_file_comment(source.file_comment());
                } else {
                    dest.append_file_comment(&format!("\n{}", source.file_comment()));
                }
            }
        }
        CommentMode::LeaveAsIs => {}
        CommentMode::Replace => dest.set_file_comment(source.file_comment()),
    }

    let mut appended = 0usize;
    let mut overwritten = 0usize;
    for (i, action) in actions.iter().enumerate() {
        if *action == ColumnAction::Skip {
            continue;
        }
        let mut meta = source.column(i).clone();
        if let Some(Some(name)) = plan.renames.get(i) {
            meta.name = name.clone();
        }
        let cells = source.column_cells(i);
        match *action {
            ColumnAction::New => {
                dest.push_column(&cells, meta)?;
                appended += 1;
            }
            ColumnAction::Overwrite(d) => {
                dest.overwrite_column(d, &cells, meta)?;
                overwritten += 1;
            }
            ColumnAction::Skip => unreachable!(),
        }
    }
    debug!(appended, overwritten, columns = dest.num_columns(), "merge complete");
    Ok(())
}

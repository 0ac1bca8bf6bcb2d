//! Row filters over [`FilterModel`].

use crate::manager::FilterManager;
use crate::model::{FilterModel, ItemData, ModelIndex, Role};

/// Case-insensitive substring filter on the title column.
///
/// A row is accepted when its title contains the filter text or when any
/// descendant row is accepted.
#[derive(Debug, Clone, Default)]
pub struct TreeProxy {
    pattern: String,
}

impl TreeProxy {
    /// Creates a filter accepting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter text.
    pub fn set_filter_fixed_string(&mut self, text: &str) {
        self.pattern = text.to_lowercase();
    }

    /// Current filter text, lowercased.
    pub fn filter(&self) -> &str {
        &self.pattern
    }

    /// Number of columns exposed.
    pub fn column_count(&self) -> usize {
        2
    }

    /// Returns true if the source row `row` under `parent` is shown.
    pub fn filter_accepts_row(
        &self,
        model: &FilterModel,
        manager: &FilterManager,
        row: usize,
        parent: Option<ModelIndex>,
    ) -> bool {
        let Some(index) = model.index(manager, row, 0, parent) else {
            return false;
        };

        if self.matches(model, manager, index) {
            return true;
        }

        (0..model.row_count(manager, Some(index)))
            .any(|child| self.filter_accepts_row(model, manager, child, Some(index)))
    }

    /// Returns true if any row of the model passes the filter.
    pub fn accepts_any(&self, model: &FilterModel, manager: &FilterManager) -> bool {
        (0..model.row_count(manager, None)).any(|row| self.filter_accepts_row(model, manager, row, None))
    }

    fn matches(&self, model: &FilterModel, manager: &FilterManager, index: ModelIndex) -> bool {
        let text = match model.data(manager, index, Role::Display) {
            Some(ItemData::Text(text)) => text,
            _ => String::new(),
        };
        text.to_lowercase().contains(&self.pattern)
    }
}

/// Single-column view listing only rows that can hold children, for
/// folder pickers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderProxy;

impl FolderProxy {
    /// Number of columns exposed.
    pub fn column_count(&self, model: &FilterModel, parent: Option<ModelIndex>) -> usize {
        model.column_count(parent).min(1)
    }

    /// Returns true if the source row is a folder.
    pub fn filter_accepts_row(
        &self,
        model: &FilterModel,
        manager: &FilterManager,
        row: usize,
        parent: Option<ModelIndex>,
    ) -> bool {
        model
            .index(manager, row, 0, parent)
            .is_some_and(|index| model.has_children(manager, Some(index)))
    }
}

//! Add/edit form state for filters and folders.
//!
//! A [`FilterDraft`] holds what the properties editor shows and applies it
//! to the manager on [`FilterDraft::accept`].

use chrono::{Local, SubsecRound};
use tracing::debug;

use crate::chain::FilterChain;
use crate::error::{FilterError, FilterResult};
use crate::manager::FilterManager;
use crate::node::{Node, NodeId, NodeKind};

/// Characters not allowed in titles; they would break current paths.
pub const RESERVED_TITLE_CHARS: [char; 2] = ['/', '|'];

/// Undo label of an edit.
pub const EDIT_MACRO_TEXT: &str = "Edit Filter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DraftMode {
    Add { parent: NodeId },
    Edit { node: NodeId },
}

/// Pending filter or folder edit.
#[derive(Debug, Clone)]
pub struct FilterDraft {
    mode: DraftMode,
    is_filter: bool,
    /// Title field.
    pub title: String,
    /// Description field (filters only).
    pub description: String,
    /// Chained filters (filters only).
    pub chain: FilterChain,
}

impl FilterDraft {
    /// Empty draft for a new filter below `parent`.
    pub fn new_filter(parent: NodeId) -> Self {
        Self::blank(DraftMode::Add { parent }, true)
    }

    /// Empty draft for a new folder below `parent`.
    pub fn new_folder(parent: NodeId) -> Self {
        Self::blank(DraftMode::Add { parent }, false)
    }

    /// Draft pre-filled from an existing filter or folder.
    pub fn edit(manager: &FilterManager, node: NodeId) -> Self {
        let entry = manager.tree().node(node);
        let is_filter = entry.kind() == NodeKind::Item;
        let mut draft = Self::blank(DraftMode::Edit { node }, is_filter);
        draft.title = entry.title.clone();
        if is_filter {
            draft.description = entry.description.clone();
            draft.chain = FilterChain::from_commands(&entry.commands);
        }
        draft
    }

    fn blank(mode: DraftMode, is_filter: bool) -> Self {
        Self {
            mode,
            is_filter,
            title: String::new(),
            description: String::new(),
            chain: FilterChain::new(),
        }
    }

    /// Returns true when editing an existing node.
    pub fn is_edit(&self) -> bool {
        matches!(self.mode, DraftMode::Edit { .. })
    }

    /// Returns true for filter drafts, false for folders.
    pub fn is_filter(&self) -> bool {
        self.is_filter
    }

    /// Applies the draft and saves the database.
    ///
    /// Edits go through the undo stack as one step; the creation date of an
    /// edited item is kept. A new item gets the current time as creation
    /// date. New nodes are appended to the parent, or placed next to it
    /// when the parent cannot hold children. Returns the edited or created
    /// node.
    pub fn accept(&self, manager: &mut FilterManager) -> FilterResult<NodeId> {
        if self.title.is_empty() {
            return Err(FilterError::EmptyTitle);
        }
        if self.title.contains(RESERVED_TITLE_CHARS) {
            return Err(FilterError::InvalidTitle(self.title.clone()));
        }

        let node = match self.mode {
            DraftMode::Edit { node } => {
                self.apply_edit(manager, node);
                node
            }
            DraftMode::Add { parent } => self.apply_add(manager, parent),
        };

        manager.save()?;
        Ok(node)
    }

    fn apply_edit(&self, manager: &mut FilterManager, node: NodeId) {
        let current = manager.tree().node(node).clone();

        manager.begin_macro(EDIT_MACRO_TEXT);
        if self.is_filter {
            let commands = self.chain.chained_filters();
            if current.commands != commands {
                manager.set_command(node, commands);
            }
        }
        if current.title != self.title {
            manager.set_title(node, self.title.clone());
        }
        if self.is_filter && current.description != self.description {
            manager.set_comment(node, self.description.clone());
        }
        manager.end_macro();

        debug!(title = %self.title, "edited filter entry");
    }

    fn apply_add(&self, manager: &mut FilterManager, parent: NodeId) -> NodeId {
        // Only items carry a creation date on disk.
        let node = if self.is_filter {
            Node::item(self.title.clone(), self.chain.chained_filters())
                .with_description(self.description.clone())
                .with_date(Local::now().naive_local().trunc_subsecs(0))
        } else {
            Node::folder(self.title.clone())
        };

        let tree = manager.tree();
        let (parent, row) = if tree.node(parent).kind().is_container() {
            (parent, None)
        } else {
            match (tree.parent(parent), tree.row(parent)) {
                (Some(grand), Some(row)) => (grand, Some(row + 1)),
                _ => (parent, None),
            }
        };

        let id = manager.create_entry(node);
        manager.add_entry(parent, id, row);
        debug!(title = %self.title, filter = self.is_filter, "added filter entry");
        id
    }
}

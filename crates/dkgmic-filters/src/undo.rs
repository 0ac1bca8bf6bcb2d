//! Undoable edits of the filter hierarchy.
//!
//! Every structural or field edit goes through a [`FilterCommand`] pushed on
//! the [`UndoStack`], which runs it immediately. Commands hold node ids, not
//! references; the tree is passed in on each redo/undo.
//!
//! A node detached by a command belongs to that command until it is
//! attached again. When the command is dropped from the stack (redo history
//! discarded, history pruned or cleared) such a node is freed.

use std::collections::VecDeque;

use tracing::trace;

use crate::node::{FilterCommands, NodeId};
use crate::tree::FilterTree;

/// Editable node field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// Chained commands.
    Command,
    /// Display title.
    Title,
    /// Comment.
    Description,
}

/// A value of one [`FilterField`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Title text.
    Title(String),
    /// Description text.
    Description(String),
    /// Command map.
    Commands(FilterCommands),
}

impl FieldValue {
    /// The field this value belongs to.
    pub fn field(&self) -> FilterField {
        match self {
            Self::Title(_) => FilterField::Title,
            Self::Description(_) => FilterField::Description,
            Self::Commands(_) => FilterField::Command,
        }
    }

    fn read(tree: &FilterTree, node: NodeId, field: FilterField) -> Self {
        let node = tree.node(node);
        match field {
            FilterField::Title => Self::Title(node.title.clone()),
            FilterField::Description => Self::Description(node.description.clone()),
            FilterField::Command => Self::Commands(node.commands.clone()),
        }
    }

    fn apply(&self, tree: &mut FilterTree, node: NodeId) {
        let node = tree.node_mut(node);
        match self {
            Self::Title(title) => node.title = title.clone(),
            Self::Description(description) => node.description = description.clone(),
            Self::Commands(commands) => node.commands = commands.clone(),
        }
    }
}

/// Change notification emitted by commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// `node` was attached to `parent` at `row`.
    Added {
        /// New parent.
        parent: NodeId,
        /// Row within `parent`.
        row: usize,
        /// Attached node.
        node: NodeId,
    },
    /// `node` was detached from `parent`, where it sat at `row`.
    Removed {
        /// Former parent.
        parent: NodeId,
        /// Former row.
        row: usize,
        /// Detached node.
        node: NodeId,
    },
    /// A field of the node changed.
    Changed(NodeId),
}

/// One reversible edit.
#[derive(Debug, Clone)]
pub enum FilterCommand {
    /// Attach a detached node.
    Insert {
        /// Target parent.
        parent: NodeId,
        /// Requested row, `None` appends.
        row: Option<usize>,
        /// Node to attach.
        node: NodeId,
        /// Whether the node is currently attached by this command.
        done: bool,
    },
    /// Detach a node.
    Remove {
        /// Parent the node is removed from.
        parent: NodeId,
        /// Row of the node within `parent`.
        row: usize,
        /// The removed node.
        node: NodeId,
        /// Whether the node is currently detached by this command.
        done: bool,
    },
    /// Replace one field.
    Change {
        /// Edited node.
        node: NodeId,
        /// Value before the edit.
        old: FieldValue,
        /// Value after the edit.
        new: FieldValue,
    },
}

impl FilterCommand {
    /// Attaches `node` under `parent` at `row` when run.
    pub fn insert(parent: NodeId, node: NodeId, row: Option<usize>) -> Self {
        Self::Insert { parent, row, node, done: false }
    }

    /// Detaches the child at `row` of `parent` when run.
    ///
    /// # Panics
    ///
    /// Panics if `parent` has no child at `row`.
    pub fn remove(tree: &FilterTree, parent: NodeId, row: usize) -> Self {
        let node = match tree.children(parent).get(row) {
            Some(&node) => node,
            None => panic!("no child at row {row}"),
        };
        Self::Remove { parent, row, node, done: false }
    }

    /// Replaces one field of `node` with `value` when run.
    pub fn change(tree: &FilterTree, node: NodeId, value: FieldValue) -> Self {
        let old = FieldValue::read(tree, node, value.field());
        Self::Change { node, old, new: value }
    }

    /// Label shown in undo menus.
    pub fn text(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "Insert Filter",
            Self::Remove { .. } => "Remove Filter",
            Self::Change { new, .. } => match new.field() {
                FilterField::Title => "Title Change",
                FilterField::Description => "Comment Change",
                FilterField::Command => "Commands Change",
            },
        }
    }

    /// Applies the edit.
    pub fn redo(&mut self, tree: &mut FilterTree, events: &mut Vec<TreeEvent>) {
        match self {
            Self::Insert { parent, row, node, done } => {
                let placed = tree.add(*parent, *node, *row);
                *row = Some(placed);
                *done = true;
                events.push(TreeEvent::Added { parent: *parent, row: placed, node: *node });
            }
            Self::Remove { parent, row, node, done } => {
                if let Some(removed) = tree.remove(*parent, *node) {
                    *row = removed;
                    *done = true;
                    events.push(TreeEvent::Removed { parent: *parent, row: removed, node: *node });
                }
            }
            Self::Change { node, new, .. } => {
                new.apply(tree, *node);
                events.push(TreeEvent::Changed(*node));
            }
        }
    }

    /// Reverts the edit.
    pub fn undo(&mut self, tree: &mut FilterTree, events: &mut Vec<TreeEvent>) {
        match self {
            Self::Insert { parent, node, done, .. } => {
                if let Some(removed) = tree.remove(*parent, *node) {
                    *done = false;
                    events.push(TreeEvent::Removed { parent: *parent, row: removed, node: *node });
                }
            }
            Self::Remove { parent, row, node, done } => {
                let placed = tree.add(*parent, *node, Some(*row));
                *done = false;
                events.push(TreeEvent::Added { parent: *parent, row: placed, node: *node });
            }
            Self::Change { node, old, .. } => {
                old.apply(tree, *node);
                events.push(TreeEvent::Changed(*node));
            }
        }
    }

    /// The node detached and owned by this command, if any.
    fn owned_node(&self, tree: &FilterTree) -> Option<NodeId> {
        let (node, owns) = match *self {
            Self::Insert { node, done, .. } => (node, !done),
            Self::Remove { node, done, .. } => (node, done),
            Self::Change { .. } => return None,
        };

        let detached = tree.get(node).is_some_and(|n| n.parent().is_none());
        (owns && detached).then_some(node)
    }

    /// Drops the command, freeing the node it owns. Returns the number of
    /// nodes freed.
    pub fn release(self, tree: &mut FilterTree) -> usize {
        match self.owned_node(tree) {
            Some(node) => {
                let freed = tree.free(node);
                trace!(freed, command = self.text(), "released detached nodes");
                freed
            }
            None => 0,
        }
    }
}

/// One undo step: a single command or a macro.
#[derive(Debug, Clone)]
struct UndoEntry {
    text: String,
    commands: Vec<FilterCommand>,
}

impl UndoEntry {
    fn release(self, tree: &mut FilterTree) -> usize {
        self.commands.into_iter().map(|c| c.release(tree)).sum()
    }
}

/// Linear undo/redo history with macro grouping.
///
/// Entries before `index` can be undone, entries from `index` on can be
/// redone.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    entries: VecDeque<UndoEntry>,
    index: usize,
    limit: Option<usize>,
    macros: Vec<UndoEntry>,
}

impl UndoStack {
    /// Creates an unbounded stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack keeping at most `limit` undo steps.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Runs `command` and records it.
    ///
    /// Outside a macro this discards the redo history.
    pub fn push(&mut self, mut command: FilterCommand, tree: &mut FilterTree, events: &mut Vec<TreeEvent>) {
        command.redo(tree, events);
        trace!(command = command.text(), "pushed undo command");

        match self.macros.last_mut() {
            Some(open) => open.commands.push(command),
            None => {
                self.discard_redo(tree);
                let text = command.text().to_string();
                self.entries.push_back(UndoEntry { text, commands: vec![command] });
                self.index = self.entries.len();
                self.prune(tree);
            }
        }
    }

    /// Starts grouping subsequent pushes into one step labelled `text`.
    /// Macros nest; only the outermost label is kept.
    pub fn begin_macro(&mut self, text: impl Into<String>, tree: &mut FilterTree) {
        if self.macros.is_empty() {
            self.discard_redo(tree);
        }
        self.macros.push(UndoEntry {
            text: text.into(),
            commands: Vec::new(),
        });
    }

    /// Closes the innermost macro. Closing the outermost one records it as
    /// a single step unless it is empty.
    pub fn end_macro(&mut self, tree: &mut FilterTree) {
        let Some(finished) = self.macros.pop() else {
            return;
        };

        match self.macros.last_mut() {
            Some(outer) => outer.commands.extend(finished.commands),
            None if finished.commands.is_empty() => {}
            None => {
                self.entries.push_back(finished);
                self.index = self.entries.len();
                self.prune(tree);
            }
        }
    }

    /// Returns true while a macro is open.
    pub fn in_macro(&self) -> bool {
        !self.macros.is_empty()
    }

    /// Reverts the last step. Returns false when there is nothing to undo
    /// or a macro is open.
    pub fn undo(&mut self, tree: &mut FilterTree, events: &mut Vec<TreeEvent>) -> bool {
        if !self.can_undo() {
            return false;
        }

        self.index -= 1;
        let entry = &mut self.entries[self.index];
        for command in entry.commands.iter_mut().rev() {
            command.undo(tree, events);
        }
        true
    }

    /// Re-applies the next step. Returns false when there is nothing to
    /// redo or a macro is open.
    pub fn redo(&mut self, tree: &mut FilterTree, events: &mut Vec<TreeEvent>) -> bool {
        if !self.can_redo() {
            return false;
        }

        let entry = &mut self.entries[self.index];
        for command in entry.commands.iter_mut() {
            command.redo(tree, events);
        }
        self.index += 1;
        true
    }

    /// Returns true if a step can be undone.
    pub fn can_undo(&self) -> bool {
        self.macros.is_empty() && self.index > 0
    }

    /// Returns true if a step can be redone.
    pub fn can_redo(&self) -> bool {
        self.macros.is_empty() && self.index < self.entries.len()
    }

    /// Label of the step [`UndoStack::undo`] would revert.
    pub fn undo_text(&self) -> Option<&str> {
        self.index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|e| e.text.as_str())
    }

    /// Label of the step [`UndoStack::redo`] would apply.
    pub fn redo_text(&self) -> Option<&str> {
        self.entries.get(self.index).map(|e| e.text.as_str())
    }

    /// Number of recorded steps.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Cursor position: number of steps currently applied.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Drops the whole history, freeing nodes it owns.
    pub fn clear(&mut self, tree: &mut FilterTree) {
        let released: usize = self
            .entries
            .drain(..)
            .chain(self.macros.drain(..))
            .map(|e| e.release(tree))
            .sum();
        self.index = 0;
        trace!(released, "undo history cleared");
    }

    fn discard_redo(&mut self, tree: &mut FilterTree) {
        while self.entries.len() > self.index {
            if let Some(entry) = self.entries.pop_back() {
                entry.release(tree);
            }
        }
    }

    fn prune(&mut self, tree: &mut FilterTree) {
        let Some(limit) = self.limit else {
            return;
        };

        while self.entries.len() > limit {
            if let Some(entry) = self.entries.pop_front() {
                entry.release(tree);
                self.index = self.index.saturating_sub(1);
            }
        }
    }
}

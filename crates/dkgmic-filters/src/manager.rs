//! Filter hierarchy manager.
//!
//! [`FilterManager`] owns the tree, the undo history and the database path.
//! All edits go through it as undo commands; views learn about them only
//! through the [`TreeEvent`] channels handed out by
//! [`FilterManager::subscribe`].

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::FilterResult;
use crate::node::{FilterCommands, Node, NodeId, NodeKind};
use crate::reader::{parse_filters_str, read_filters, FilterDocument};
use crate::tree::FilterTree;
use crate::undo::{FieldValue, FilterCommand, TreeEvent, UndoStack};
use crate::writer::write_filters;

/// File name of the filter database.
pub const DATABASE_FILE_NAME: &str = "gmicfilters.xml";

/// Default database location: `<data dir>/digikam/gmicfilters.xml`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("digikam").join(DATABASE_FILE_NAME))
}

/// Owner of the filter hierarchy and its undo history.
#[derive(Debug)]
pub struct FilterManager {
    file: PathBuf,
    loaded: bool,
    tree: FilterTree,
    stack: UndoStack,
    current_path: String,
    subscribers: Vec<Sender<TreeEvent>>,
}

impl FilterManager {
    /// Creates a manager for the database at `file`. Nothing is read until
    /// [`FilterManager::load`] or [`FilterManager::commands`].
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            loaded: false,
            tree: FilterTree::new(),
            stack: UndoStack::new(),
            current_path: String::new(),
            subscribers: Vec::new(),
        }
    }

    /// Database path.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Returns true once the database has been read.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Reads the database once.
    ///
    /// On a parse error the manager still counts as loaded and holds the
    /// first-run skeleton; the error is returned for reporting.
    pub fn load(&mut self) -> FilterResult<()> {
        if self.loaded {
            return Ok(());
        }

        debug!(path = %self.file.display(), "loading G'MIC filters");
        self.loaded = true;

        let (document, outcome) = match read_filters(&self.file) {
            Ok(document) => (document, Ok(())),
            Err(e) => {
                warn!(path = %self.file.display(), error = %e, "failed to load G'MIC filters");
                (FilterDocument::skeleton(), Err(e))
            }
        };

        self.stack.clear(&mut self.tree);
        self.tree = document.tree;
        self.current_path = document.current_path;
        outcome
    }

    /// Writes the tree and current path to the database. Does nothing
    /// before the first load. In-memory state is kept on failure.
    pub fn save(&self) -> FilterResult<()> {
        if !self.loaded {
            return Ok(());
        }

        debug!(path = %self.file.display(), "saving G'MIC filters");

        if let Some(parent) = self.file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        write_filters(&self.file, &self.tree, self.tree.root(), &self.current_path).inspect_err(|e| {
            warn!(path = %self.file.display(), error = %e, "error saving G'MIC filters");
        })
    }

    /// Root of the hierarchy, loading the database first if needed.
    pub fn commands(&mut self) -> NodeId {
        if !self.loaded {
            // Errors are logged by load; the skeleton is in place either way.
            let _ = self.load();
        }
        self.tree.root()
    }

    /// The hierarchy.
    pub fn tree(&self) -> &FilterTree {
        &self.tree
    }

    /// Allocates a detached node, ready for [`FilterManager::add_entry`].
    ///
    /// Loads the database first, so the id stays valid afterwards.
    pub fn create_entry(&mut self, node: Node) -> NodeId {
        self.commands();
        self.tree.insert_detached(node)
    }

    /// Deep-copies `node` of another tree into a detached entry. Loads the
    /// database first, like [`FilterManager::create_entry`].
    pub fn copy_entry(&mut self, source: &FilterTree, node: NodeId) -> NodeId {
        self.commands();
        self.tree.graft(source, node)
    }

    /// Attaches `node` under `parent` at `row` (append when `None`).
    ///
    /// # Panics
    ///
    /// Panics if either id is stale.
    pub fn add_entry(&mut self, parent: NodeId, node: NodeId, row: Option<usize>) {
        if !self.loaded {
            return;
        }
        assert!(self.tree.contains(parent), "add_entry: unknown parent");
        assert!(self.tree.contains(node), "add_entry: unknown node");

        self.push(FilterCommand::insert(parent, node, row));
    }

    /// Detaches `node` from its parent.
    ///
    /// # Panics
    ///
    /// Panics if `node` is stale or has no parent.
    pub fn remove_entry(&mut self, node: NodeId) {
        if !self.loaded {
            return;
        }
        assert!(self.tree.contains(node), "remove_entry: unknown node");

        let (Some(parent), Some(row)) = (self.tree.parent(node), self.tree.row(node)) else {
            panic!("remove_entry: node is not attached");
        };
        let command = FilterCommand::remove(&self.tree, parent, row);
        self.push(command);
    }

    /// Renames `node`.
    pub fn set_title(&mut self, node: NodeId, title: impl Into<String>) {
        self.change(node, FieldValue::Title(title.into()));
    }

    /// Replaces the command map of `node`.
    pub fn set_command(&mut self, node: NodeId, commands: FilterCommands) {
        self.change(node, FieldValue::Commands(commands));
    }

    /// Replaces the comment of `node`. Only items keep a comment on disk;
    /// other kinds are left unchanged.
    pub fn set_comment(&mut self, node: NodeId, comment: impl Into<String>) {
        if let Some(entry) = self.tree.get(node) {
            if entry.kind() != NodeKind::Item {
                debug!(kind = entry.kind().label(), "ignoring comment on a non-item entry");
                return;
            }
        }
        self.change(node, FieldValue::Description(comment.into()));
    }

    /// Records the expanded state of a folder. Not undoable.
    pub fn set_expanded(&mut self, node: NodeId, expanded: bool) {
        if !self.loaded {
            return;
        }
        let entry = self.tree.node_mut(node);
        if entry.expanded != expanded {
            entry.expanded = expanded;
            self.notify(&[TreeEvent::Changed(node)]);
        }
    }

    /// Last selected path.
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Sets the last selected path.
    pub fn set_current_path(&mut self, path: impl Into<String>) {
        self.current_path = path.into();
    }

    /// Path of `node` suitable for [`FilterManager::set_current_path`].
    pub fn path_of(&self, node: NodeId) -> String {
        self.tree.path_of(node)
    }

    /// Resolves the stored current path.
    pub fn current_node(&self) -> Option<NodeId> {
        self.tree.resolve_path(&self.current_path)
    }

    /// Chained command of the node at the current path, empty unless it is
    /// an item.
    pub fn current_command(&self) -> String {
        self.current_node()
            .map(|id| self.tree.node(id))
            .filter(|node| node.kind() == NodeKind::Item)
            .map(|node| node.commands.chained())
            .unwrap_or_default()
    }

    /// The undo history.
    pub fn undo_stack(&self) -> &UndoStack {
        &self.stack
    }

    /// Reverts the last step.
    pub fn undo(&mut self) -> bool {
        let mut events = Vec::new();
        let done = self.stack.undo(&mut self.tree, &mut events);
        self.notify(&events);
        done
    }

    /// Re-applies the next step.
    pub fn redo(&mut self) -> bool {
        let mut events = Vec::new();
        let done = self.stack.redo(&mut self.tree, &mut events);
        self.notify(&events);
        done
    }

    /// Groups the following edits into one undo step.
    pub fn begin_macro(&mut self, text: impl Into<String>) {
        self.stack.begin_macro(text, &mut self.tree);
    }

    /// Closes the innermost macro.
    pub fn end_macro(&mut self) {
        self.stack.end_macro(&mut self.tree);
    }

    /// Returns a channel receiving every subsequent [`TreeEvent`].
    pub fn subscribe(&mut self) -> Receiver<TreeEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Reads the database at `path` and adds its content as a new folder
    /// titled "Imported Filters <date>" under the root folder. Undoable.
    pub fn import_filters(&mut self, path: &Path) -> FilterResult<NodeId> {
        let title = format!("Imported Filters {}", Local::now().format("%Y-%m-%d"));
        self.import_filters_with_title(path, title)
    }

    /// [`FilterManager::import_filters`] with an explicit folder title.
    pub fn import_filters_with_title(&mut self, path: &Path, title: impl Into<String>) -> FilterResult<NodeId> {
        let text = std::fs::read_to_string(path)?;
        let document = parse_filters_str(&text, false)?;

        let root = self.commands();
        let parent = self.tree.root_folder().unwrap_or(root);

        let imported = self.tree.insert_detached(Node::folder(title));
        for &child in document.tree.children(document.tree.root()) {
            let copy = self.copy_entry(&document.tree, child);
            self.tree.add(imported, copy, None);
        }

        info!(path = %path.display(), nodes = document.tree.len() - 1, "importing G'MIC filters");
        self.add_entry(parent, imported, None);
        Ok(imported)
    }

    /// Writes the whole hierarchy to `path`. Does not touch the history.
    pub fn export_filters(&self, path: &Path) -> FilterResult<()> {
        info!(path = %path.display(), "exporting G'MIC filters");
        write_filters(path, &self.tree, self.tree.root(), &self.current_path)
    }

    fn change(&mut self, node: NodeId, value: FieldValue) {
        if !self.loaded {
            return;
        }
        assert!(self.tree.contains(node), "unknown node");

        let command = FilterCommand::change(&self.tree, node, value);
        self.push(command);
    }

    fn push(&mut self, command: FilterCommand) {
        let mut events = Vec::new();
        self.stack.push(command, &mut self.tree, &mut events);
        self.notify(&events);
    }

    fn notify(&mut self, events: &[TreeEvent]) {
        if events.is_empty() {
            return;
        }
        self.subscribers
            .retain(|tx| events.iter().all(|event| tx.send(*event).is_ok()));
    }
}

//! Indexed tree model over the filter hierarchy.
//!
//! [`FilterModel`] addresses nodes by `(row, column, parent)` the way a tree
//! view does. `None` stands for the invisible root; the root folder is row 0
//! below it. The model keeps no copy of the tree: rows are recomputed from
//! the manager on every call, and manager edits arrive as [`TreeEvent`]s
//! that [`FilterModel::process_events`] turns into view notifications.
//!
//! Drag and drop moves serialized subtrees (see [`FILTERS_MIME_TYPE`]).
//! A drop inserts copies inside a "Move Filters" undo macro; for a move the
//! macro stays open until the source rows are removed with
//! [`FilterModel::remove_rows`], so the whole move undoes as one step.

use std::sync::mpsc::Receiver;

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::error::{FilterError, FilterResult};
use crate::manager::FilterManager;
use crate::node::{FilterCommands, NodeId, NodeKind};
use crate::reader::{parse_filters_str, FilterDocument};
use crate::undo::TreeEvent;
use crate::writer::write_filters_to;

/// MIME type of dragged filter subtrees.
pub const FILTERS_MIME_TYPE: &str = "application/gmicfilters.xml";

/// Undo label of a drop.
pub const MOVE_MACRO_TEXT: &str = "Move Filters";

/// Number of columns: title and comment.
pub const COLUMN_COUNT: usize = 2;

/// Address of a model row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelIndex {
    row: usize,
    column: usize,
    node: NodeId,
}

impl ModelIndex {
    /// Row within the parent.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column: 0 title, 1 comment.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Node behind the row.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Data roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Column text.
    Display,
    /// Item summary.
    ToolTip,
    /// Command map.
    Command,
    /// Creation time.
    DateAdded,
    /// Node kind.
    Kind,
    /// Whether the row is a separator.
    Separator,
}

/// Value returned by [`FilterModel::data`] and taken by
/// [`FilterModel::set_data`].
#[derive(Debug, Clone, PartialEq)]
pub enum ItemData {
    /// Text value.
    Text(String),
    /// Command map.
    Commands(FilterCommands),
    /// Timestamp.
    Date(NaiveDateTime),
    /// Node kind.
    Kind(NodeKind),
    /// Flag.
    Bool(bool),
}

/// Interaction flags of a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFlags {
    /// Row can be selected.
    pub selectable: bool,
    /// Row is enabled.
    pub enabled: bool,
    /// Row can be dragged.
    pub drag_enabled: bool,
    /// Rows can be dropped onto this row.
    pub drop_enabled: bool,
}

/// Drag and drop action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    /// Nothing to do.
    Ignore,
    /// Insert copies; sources stay.
    Copy,
    /// Insert copies; sources are removed afterwards.
    Move,
}

/// Drag payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeData {
    /// MIME type.
    pub format: String,
    /// Encoded content.
    pub data: Vec<u8>,
}

impl MimeData {
    /// Returns true if the payload is of type `format`.
    pub fn has_format(&self, format: &str) -> bool {
        self.format == format
    }
}

/// View notification derived from a [`TreeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    /// Rows `first..=last` were inserted under `parent`.
    RowsInserted {
        /// Parent row, `None` for the root.
        parent: Option<ModelIndex>,
        /// First inserted row.
        first: usize,
        /// Last inserted row.
        last: usize,
    },
    /// Rows `first..=last` were removed from `parent`.
    RowsRemoved {
        /// Parent row, `None` for the root.
        parent: Option<ModelIndex>,
        /// First removed row.
        first: usize,
        /// Last removed row.
        last: usize,
    },
    /// The data of a row changed.
    DataChanged(ModelIndex),
}

/// Tree model adapter over a [`FilterManager`].
#[derive(Debug)]
pub struct FilterModel {
    events: Receiver<TreeEvent>,
    pending_macro: bool,
}

impl FilterModel {
    /// Creates a model listening to `manager`, loading it if needed.
    pub fn new(manager: &mut FilterManager) -> Self {
        manager.commands();
        Self {
            events: manager.subscribe(),
            pending_macro: false,
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Node behind `index`; the root for `None`.
    pub fn node(&self, manager: &FilterManager, index: Option<ModelIndex>) -> NodeId {
        index.map_or(manager.tree().root(), |i| i.node)
    }

    /// Index of `node` in column 0. `None` for the root or detached nodes.
    pub fn index_of(&self, manager: &FilterManager, node: NodeId) -> Option<ModelIndex> {
        let tree = manager.tree();
        tree.get(node)?;
        let row = tree.row(node)?;
        Some(ModelIndex { row, column: 0, node })
    }

    /// Index of the child at `row`/`column` of `parent`.
    pub fn index(
        &self,
        manager: &FilterManager,
        row: usize,
        column: usize,
        parent: Option<ModelIndex>,
    ) -> Option<ModelIndex> {
        if row >= self.row_count(manager, parent) || column >= self.column_count(parent) {
            return None;
        }

        let node = manager.tree().children(self.node(manager, parent))[row];
        Some(ModelIndex { row, column, node })
    }

    /// Parent of `index`, `None` for top-level rows.
    pub fn parent(&self, manager: &FilterManager, index: ModelIndex) -> Option<ModelIndex> {
        let tree = manager.tree();
        let parent = tree.get(index.node)?.parent()?;
        if parent == tree.root() {
            return None;
        }
        self.index_of(manager, parent)
    }

    /// Number of rows below `parent`.
    pub fn row_count(&self, manager: &FilterManager, parent: Option<ModelIndex>) -> usize {
        if parent.is_some_and(|p| p.column > 0) {
            return 0;
        }
        manager
            .tree()
            .get(self.node(manager, parent))
            .map_or(0, |n| n.children().len())
    }

    /// Number of columns below `parent`.
    pub fn column_count(&self, parent: Option<ModelIndex>) -> usize {
        if parent.is_some_and(|p| p.column > 0) {
            0
        } else {
            COLUMN_COUNT
        }
    }

    /// Returns true if rows can exist below `parent`.
    pub fn has_children(&self, manager: &FilterManager, parent: Option<ModelIndex>) -> bool {
        match parent {
            None => true,
            Some(index) => manager
                .tree()
                .get(index.node)
                .is_some_and(|n| n.kind().is_folder()),
        }
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// Column header text.
    pub fn header_data(&self, section: usize) -> Option<&'static str> {
        match section {
            0 => Some("Title"),
            1 => Some("Comment"),
            _ => None,
        }
    }

    /// Value of `index` for `role`.
    pub fn data(&self, manager: &FilterManager, index: ModelIndex, role: Role) -> Option<ItemData> {
        let node = manager.tree().get(index.node)?;

        match role {
            Role::ToolTip => (node.kind() == NodeKind::Item).then(|| {
                let names = node.commands.names().collect::<Vec<_>>().join(", ");
                ItemData::Text(format!(
                    "{}\nG'MIC items: {}\nChained Filters: {}\nDescription: {}",
                    node.title,
                    node.commands.len(),
                    names,
                    node.description
                ))
            }),
            Role::Display => {
                if node.kind() == NodeKind::Separator {
                    return None;
                }
                match index.column {
                    0 => Some(ItemData::Text(node.title.clone())),
                    1 => Some(ItemData::Text(node.description.clone())),
                    _ => None,
                }
            }
            Role::Command => Some(ItemData::Commands(node.commands.clone())),
            Role::DateAdded => node.date_added.map(ItemData::Date),
            Role::Kind => Some(ItemData::Kind(node.kind())),
            Role::Separator => Some(ItemData::Bool(node.kind() == NodeKind::Separator)),
        }
    }

    /// Interaction flags of `index`.
    pub fn flags(&self, manager: &FilterManager, index: Option<ModelIndex>) -> ItemFlags {
        let Some(index) = index else {
            return ItemFlags::default();
        };
        let Some(node) = manager.tree().get(index.node) else {
            return ItemFlags::default();
        };

        ItemFlags {
            selectable: true,
            enabled: true,
            drag_enabled: node.kind() != NodeKind::RootFolder,
            drop_enabled: self.has_children(manager, Some(index)),
        }
    }

    /// Edits a row through the manager. Returns false for unsupported
    /// role, column or value combinations; only items take a comment.
    pub fn set_data(&self, manager: &mut FilterManager, index: ModelIndex, value: ItemData, role: Role) -> bool {
        let is_item = manager.tree().get(index.node).is_some_and(|n| n.kind() == NodeKind::Item);

        match (role, index.column, value) {
            (Role::Display, 0, ItemData::Text(title)) => manager.set_title(index.node, title),
            (Role::Display, 1, ItemData::Text(comment)) if is_item => manager.set_comment(index.node, comment),
            (Role::Command, _, ItemData::Commands(commands)) => manager.set_command(index.node, commands),
            _ => return false,
        }
        true
    }

    /// Removes `count` rows starting at `row` below `parent`, closing a
    /// pending move macro.
    pub fn remove_rows(
        &mut self,
        manager: &mut FilterManager,
        row: usize,
        count: usize,
        parent: Option<ModelIndex>,
    ) -> bool {
        if count == 0 || row + count > self.row_count(manager, parent) {
            return false;
        }

        let parent_node = self.node(manager, parent);
        for i in (row..row + count).rev() {
            let child = manager.tree().children(parent_node)[i];
            manager.remove_entry(child);
        }

        self.finish_move(manager);
        true
    }

    // ========================================================================
    // Drag and drop
    // ========================================================================

    /// Drop actions the model accepts.
    pub fn supported_drop_actions(&self) -> &'static [DropAction] {
        &[DropAction::Copy, DropAction::Move]
    }

    /// MIME types the model produces and accepts.
    pub fn mime_types(&self) -> &'static [&'static str] {
        &[FILTERS_MIME_TYPE]
    }

    /// Serializes the column-0 rows of `indexes`.
    ///
    /// Each row is written as a standalone document, prefixed by its byte
    /// length as a big-endian `u32`.
    pub fn mime_data(&self, manager: &FilterManager, indexes: &[ModelIndex]) -> FilterResult<MimeData> {
        let mut data = Vec::new();

        for index in indexes.iter().filter(|i| i.column == 0) {
            let mut encoded = Vec::new();
            write_filters_to(&mut encoded, manager.tree(), index.node, "")?;
            let len = u32::try_from(encoded.len())
                .map_err(|_| FilterError::Payload("subtree too large".into()))?;
            data.extend_from_slice(&len.to_be_bytes());
            data.extend_from_slice(&encoded);
        }

        Ok(MimeData {
            format: FILTERS_MIME_TYPE.to_string(),
            data,
        })
    }

    /// Inserts the subtrees of `data` below `parent`, starting at `row`
    /// (0 when `None`), keeping their order.
    ///
    /// Returns `Ok(false)` when the payload is not for this model.
    pub fn drop_mime_data(
        &mut self,
        manager: &mut FilterManager,
        data: &MimeData,
        action: DropAction,
        row: Option<usize>,
        column: usize,
        parent: Option<ModelIndex>,
    ) -> FilterResult<bool> {
        if action == DropAction::Ignore {
            return Ok(true);
        }
        if !data.has_format(FILTERS_MIME_TYPE) || column > 0 {
            return Ok(false);
        }

        let documents = decode_payload(&data.data)?;
        if documents.is_empty() {
            return Ok(false);
        }

        let parent_node = self.node(manager, parent);
        let mut row = row.unwrap_or(0);
        let mut added = 0;

        manager.begin_macro(MOVE_MACRO_TEXT);
        for document in &documents {
            let tree = &document.tree;
            for &child in tree.children(tree.root()) {
                let copy = manager.copy_entry(tree, child);
                manager.add_entry(parent_node, copy, Some(row));
                row += 1;
                added += 1;
            }
        }
        debug!(added, ?action, "dropped filters");

        if action == DropAction::Move && added > 0 {
            self.pending_macro = true;
        } else {
            manager.end_macro();
        }
        Ok(true)
    }

    /// Moves `nodes` below `parent` at `row` as one undo step.
    ///
    /// Returns false if a node would be moved into its own subtree or is
    /// the root folder.
    pub fn move_entries(
        &mut self,
        manager: &mut FilterManager,
        nodes: &[NodeId],
        parent: NodeId,
        row: Option<usize>,
    ) -> FilterResult<bool> {
        let tree = manager.tree();
        if nodes.is_empty() || !tree.get(parent).is_some_and(|p| p.kind().is_container()) {
            return Ok(false);
        }
        let movable = nodes.iter().all(|&node| {
            tree.get(node).is_some_and(|n| n.kind() != NodeKind::RootFolder && n.parent().is_some())
                && !tree.is_ancestor(node, parent)
        });
        if !movable {
            return Ok(false);
        }

        let indexes: Vec<_> = nodes.iter().filter_map(|&n| self.index_of(manager, n)).collect();
        let data = self.mime_data(manager, &indexes)?;
        let target = self.index_of(manager, parent);

        if !self.drop_mime_data(manager, &data, DropAction::Move, row, 0, target)? {
            return Ok(false);
        }
        for &node in nodes {
            manager.remove_entry(node);
        }
        self.finish_move(manager);
        Ok(true)
    }

    /// Drains pending manager events into view notifications.
    pub fn process_events(&self, manager: &FilterManager) -> Vec<ModelEvent> {
        let root = manager.tree().root();
        let parent_index = |parent: NodeId| -> Option<Option<ModelIndex>> {
            if parent == root {
                Some(None)
            } else {
                self.index_of(manager, parent).map(Some)
            }
        };

        let mut out = Vec::new();
        for event in self.events.try_iter() {
            let translated = match event {
                TreeEvent::Added { parent, row, .. } => {
                    parent_index(parent).map(|parent| ModelEvent::RowsInserted { parent, first: row, last: row })
                }
                TreeEvent::Removed { parent, row, .. } => {
                    parent_index(parent).map(|parent| ModelEvent::RowsRemoved { parent, first: row, last: row })
                }
                TreeEvent::Changed(node) => self.index_of(manager, node).map(ModelEvent::DataChanged),
            };

            match translated {
                Some(event) => out.push(event),
                None => trace!(?event, "event for a row outside the model"),
            }
        }
        out
    }

    fn finish_move(&mut self, manager: &mut FilterManager) {
        if self.pending_macro {
            manager.end_macro();
            self.pending_macro = false;
        }
    }
}

/// Splits a drag payload into its documents.
pub fn decode_payload(data: &[u8]) -> FilterResult<Vec<FilterDocument>> {
    let mut documents = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let Some((len, tail)) = rest.split_first_chunk::<4>() else {
            return Err(FilterError::Payload("truncated length prefix".into()));
        };
        let len = u32::from_be_bytes(*len);
        // Null byte arrays are encoded as 0xFFFFFFFF.
        if len == u32::MAX {
            rest = tail;
            continue;
        }

        let len = len as usize;
        if tail.len() < len {
            return Err(FilterError::Payload(format!(
                "expected {len} bytes, found {}",
                tail.len()
            )));
        }
        let (chunk, tail) = tail.split_at(len);
        let text = std::str::from_utf8(chunk).map_err(|e| FilterError::Payload(e.to_string()))?;
        documents.push(parse_filters_str(text, false)?);
        rest = tail;
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    struct Fixture {
        _dir: tempfile::TempDir,
        mgr: FilterManager,
        model: FilterModel,
        rf: NodeId,
        portrait: NodeId,
        sharpen: NodeId,
        sep: NodeId,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = FilterManager::new(dir.path().join("gmicfilters.xml"));
        let model = FilterModel::new(&mut mgr);
        let rf = mgr.tree().root_folder().unwrap();

        let portrait = mgr.create_entry(Node::folder("Portrait"));
        mgr.add_entry(rf, portrait, None);
        let sharpen = mgr.create_entry(
            Node::item("Sharpen", [("unsharp", "fx_unsharp 1")].into_iter().collect())
                .with_description("crisp"),
        );
        mgr.add_entry(portrait, sharpen, None);
        let sep = mgr.create_entry(Node::separator());
        mgr.add_entry(rf, sep, None);

        model.process_events(&mgr);
        Fixture { _dir: dir, mgr, model, rf, portrait, sharpen, sep }
    }

    #[test]
    fn addressing() {
        let f = fixture();
        let (mgr, model) = (&f.mgr, &f.model);

        assert_eq!(model.row_count(mgr, None), 1);
        let rf = model.index(mgr, 0, 0, None).unwrap();
        assert_eq!(rf.node(), f.rf);
        assert_eq!(model.parent(mgr, rf), None);

        assert_eq!(model.row_count(mgr, Some(rf)), 2);
        let sep = model.index(mgr, 1, 0, Some(rf)).unwrap();
        assert_eq!(sep.node(), f.sep);

        let portrait = model.index(mgr, 0, 0, Some(rf)).unwrap();
        let sharpen = model.index(mgr, 0, 1, Some(portrait)).unwrap();
        assert_eq!(sharpen.node(), f.sharpen);
        assert_eq!(model.parent(mgr, sharpen), Some(portrait));
        assert_eq!(model.index_of(mgr, f.portrait), Some(portrait));

        assert!(model.index(mgr, 2, 0, Some(rf)).is_none());
        assert!(model.index(mgr, 0, 2, Some(rf)).is_none());
        assert_eq!(model.row_count(mgr, Some(sharpen)), 0);
        assert_eq!(model.column_count(Some(sharpen)), 0);
        assert_eq!(model.index_of(mgr, mgr.tree().root()), None);
    }

    #[test]
    fn data_and_flags() {
        let f = fixture();
        let (mgr, model) = (&f.mgr, &f.model);
        let sharpen = model.index_of(mgr, f.sharpen).unwrap();
        let comment = model.index(mgr, 0, 1, model.parent(mgr, sharpen)).unwrap();

        assert_eq!(model.data(mgr, sharpen, Role::Display), Some(ItemData::Text("Sharpen".into())));
        assert_eq!(model.data(mgr, comment, Role::Display), Some(ItemData::Text("crisp".into())));
        assert_eq!(model.data(mgr, sharpen, Role::Kind), Some(ItemData::Kind(NodeKind::Item)));
        assert_eq!(model.data(mgr, sharpen, Role::DateAdded), None);

        let Some(ItemData::Text(tip)) = model.data(mgr, sharpen, Role::ToolTip) else {
            panic!("items have a tooltip");
        };
        assert!(tip.contains("G'MIC items: 1"));
        assert!(tip.contains("Chained Filters: unsharp"));

        let sep = model.index_of(mgr, f.sep).unwrap();
        assert_eq!(model.data(mgr, sep, Role::Display), None);
        assert_eq!(model.data(mgr, sep, Role::Separator), Some(ItemData::Bool(true)));
        assert_eq!(model.header_data(1), Some("Comment"));

        let rf = model.index_of(mgr, f.rf).unwrap();
        let flags = model.flags(mgr, Some(rf));
        assert!(!flags.drag_enabled && flags.drop_enabled);
        let flags = model.flags(mgr, Some(sharpen));
        assert!(flags.drag_enabled && !flags.drop_enabled);
        assert!(model.has_children(mgr, model.index_of(mgr, f.portrait)));
        assert_eq!(model.flags(mgr, None), ItemFlags::default());
    }

    #[test]
    fn set_data_goes_through_undo() {
        let mut f = fixture();
        let sharpen = f.model.index_of(&f.mgr, f.sharpen).unwrap();

        assert!(f.model.set_data(&mut f.mgr, sharpen, ItemData::Text("Sharper".into()), Role::Display));
        assert!(!f.model.set_data(&mut f.mgr, sharpen, ItemData::Bool(true), Role::Display));
        assert_eq!(f.mgr.tree().node(f.sharpen).title, "Sharper");
        assert_eq!(f.model.process_events(&f.mgr), [ModelEvent::DataChanged(sharpen)]);

        f.mgr.undo();
        assert_eq!(f.mgr.tree().node(f.sharpen).title, "Sharpen");
    }

    #[test]
    fn comment_column_only_for_items() {
        let mut f = fixture();
        let rf = f.model.index_of(&f.mgr, f.rf).unwrap();
        let portrait = f.model.index(&f.mgr, 0, 1, Some(rf)).unwrap();
        let sharpen = f.model.index(&f.mgr, 0, 1, Some(f.model.index_of(&f.mgr, f.portrait).unwrap())).unwrap();
        let count = f.mgr.undo_stack().count();

        assert!(!f.model.set_data(&mut f.mgr, portrait, ItemData::Text("folder note".into()), Role::Display));
        assert_eq!(f.mgr.tree().node(f.portrait).description, "");
        assert_eq!(f.mgr.undo_stack().count(), count);

        assert!(f.model.set_data(&mut f.mgr, sharpen, ItemData::Text("sharper".into()), Role::Display));
        assert_eq!(f.mgr.tree().node(f.sharpen).description, "sharper");
    }

    #[test]
    fn events_translate_to_rows() {
        let mut f = fixture();
        let portrait = f.model.index_of(&f.mgr, f.portrait).unwrap();

        let blur = f.mgr.create_entry(Node::item("Blur", FilterCommands::new()));
        f.mgr.add_entry(f.portrait, blur, Some(0));
        f.mgr.remove_entry(f.sharpen);

        assert_eq!(
            f.model.process_events(&f.mgr),
            [
                ModelEvent::RowsInserted { parent: Some(portrait), first: 0, last: 0 },
                ModelEvent::RowsRemoved { parent: Some(portrait), first: 1, last: 1 },
            ]
        );
    }

    #[test]
    fn payload_round_trip() {
        let f = fixture();
        let portrait = f.model.index_of(&f.mgr, f.portrait).unwrap();
        let sep = f.model.index_of(&f.mgr, f.sep).unwrap();
        let data = f.model.mime_data(&f.mgr, &[portrait, sep]).unwrap();
        assert!(data.has_format(FILTERS_MIME_TYPE));

        let docs = decode_payload(&data.data).unwrap();
        assert_eq!(docs.len(), 2);
        let copy = docs[0].tree.children(docs[0].tree.root())[0];
        assert!(docs[0].tree.subtree_eq(copy, f.mgr.tree(), f.portrait));

        assert!(decode_payload(&data.data[..data.data.len() - 1]).is_err());
        assert!(decode_payload(&[0, 0]).is_err());
    }

    #[test]
    fn drop_move_is_one_undo_step() {
        let mut f = fixture();
        let before = f.mgr.tree().clone();
        let sharpen = f.model.index_of(&f.mgr, f.sharpen).unwrap();
        let rf = f.model.index_of(&f.mgr, f.rf).unwrap();

        let data = f.model.mime_data(&f.mgr, &[sharpen]).unwrap();
        assert!(f.model.drop_mime_data(&mut f.mgr, &data, DropAction::Move, Some(1), 0, Some(rf)).unwrap());
        assert!(f.mgr.undo_stack().in_macro());
        let portrait = f.model.index_of(&f.mgr, f.portrait).unwrap();
        assert!(f.model.remove_rows(&mut f.mgr, 0, 1, Some(portrait)));
        assert!(!f.mgr.undo_stack().in_macro());

        let tree = f.mgr.tree();
        assert_eq!(tree.children(f.rf).len(), 3);
        assert_eq!(tree.node(tree.children(f.rf)[1]).title, "Sharpen");
        assert!(tree.children(f.portrait).is_empty());
        assert_eq!(f.mgr.undo_stack().undo_text(), Some(MOVE_MACRO_TEXT));

        assert!(f.mgr.undo());
        assert!(f.mgr.tree() == &before);
    }

    #[test]
    fn drop_copy_keeps_order() {
        let mut f = fixture();
        let portrait = f.model.index_of(&f.mgr, f.portrait).unwrap();
        let sep = f.model.index_of(&f.mgr, f.sep).unwrap();
        let data = f.model.mime_data(&f.mgr, &[sep, portrait]).unwrap();

        assert!(f.model.drop_mime_data(&mut f.mgr, &data, DropAction::Copy, None, 0, Some(portrait)).unwrap());
        assert!(!f.mgr.undo_stack().in_macro());

        let tree = f.mgr.tree();
        let kinds: Vec<_> = tree.children(f.portrait).iter().map(|&c| tree.node(c).kind()).collect();
        assert_eq!(kinds, [NodeKind::Separator, NodeKind::Folder, NodeKind::Item]);
    }

    #[test]
    fn drop_rejections() {
        let mut f = fixture();
        let rf = f.model.index_of(&f.mgr, f.rf).unwrap();
        let other = MimeData { format: "text/plain".into(), data: Vec::new() };
        assert!(!f.model.drop_mime_data(&mut f.mgr, &other, DropAction::Move, None, 0, Some(rf)).unwrap());

        let empty = MimeData { format: FILTERS_MIME_TYPE.into(), data: Vec::new() };
        assert!(!f.model.drop_mime_data(&mut f.mgr, &empty, DropAction::Move, None, 0, Some(rf)).unwrap());
        assert!(!f.model.drop_mime_data(&mut f.mgr, &empty, DropAction::Move, None, 1, Some(rf)).unwrap());
        assert!(f.model.drop_mime_data(&mut f.mgr, &other, DropAction::Ignore, None, 0, Some(rf)).unwrap());
        assert_eq!(f.mgr.undo_stack().count(), 3);
    }

    #[test]
    fn move_entries_refuses_own_subtree() {
        let mut f = fixture();
        assert!(!f.model.move_entries(&mut f.mgr, &[f.portrait], f.portrait, None).unwrap());
        assert!(!f.model.move_entries(&mut f.mgr, &[f.rf], f.portrait, None).unwrap());

        assert!(f.model.move_entries(&mut f.mgr, &[f.sep], f.portrait, Some(0)).unwrap());
        let tree = f.mgr.tree();
        assert_eq!(tree.children(f.rf).len(), 1);
        assert_eq!(tree.node(tree.children(f.portrait)[0]).kind(), NodeKind::Separator);
        assert_eq!(tree.parent(f.sep), None);

        assert!(f.mgr.undo());
        assert_eq!(f.mgr.tree().children(f.rf).len(), 2);
        assert_eq!(f.mgr.tree().parent(f.sep), Some(f.rf));
    }
}

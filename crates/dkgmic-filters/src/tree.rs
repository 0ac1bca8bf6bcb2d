//! Arena-backed filter hierarchy.
//!
//! [`FilterTree`] owns every [`Node`] in a slot vector addressed by
//! generational [`NodeId`]s. Parents own their children through the
//! `children` list; the `parent` link is navigation only. Detached
//! subtrees stay allocated until [`FilterTree::free`] is called, which
//! lets undo commands hand removed nodes back and forth without copying.

use crate::node::{Node, NodeId, NodeKind};

/// Path separator used for current-path strings.
pub const PATH_SEPARATOR: char = '/';

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Node arena with a single invisible root.
#[derive(Debug, Clone)]
pub struct FilterTree {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    live: usize,
    root: NodeId,
}

impl Default for FilterTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterTree {
    /// Creates a tree holding only the invisible root.
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            live: 0,
            root: NodeId { index: 0, generation: 0 },
        };
        tree.root = tree.insert_detached(Node::new(NodeKind::Root));
        tree
    }

    /// Creates the first-run skeleton: root with one titled root folder.
    pub fn with_root_folder(title: impl Into<String>) -> Self {
        let mut tree = Self::new();
        let mut folder = Node::new(NodeKind::RootFolder);
        folder.title = title.into();
        let folder = tree.insert_detached(folder);
        tree.add(tree.root, folder, None);
        tree
    }

    /// The invisible root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The first child of the root, normally the root folder.
    pub fn root_folder(&self) -> Option<NodeId> {
        self.node(self.root).children.first().copied()
    }

    /// Number of allocated nodes, attached or not.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if only the root exists.
    pub fn is_empty(&self) -> bool {
        self.node(self.root).children.is_empty()
    }

    /// Allocates a node outside the hierarchy.
    ///
    /// Links carried by `node` are cleared; children are attached with
    /// [`FilterTree::add`].
    pub fn insert_detached(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        self.live += 1;

        match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.node = Some(node);
                NodeId { index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, node: Some(node) });
                NodeId { index, generation: 0 }
            }
        }
    }

    /// Returns true while `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Looks up a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Looks up a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node id {id:?}"),
        }
    }

    /// Mutable variant of [`FilterTree::node`].
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale node id {id:?}"),
        }
    }

    /// Children of `id`.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Index of `id` within its parent, `None` when detached.
    pub fn row(&self, id: NodeId) -> Option<usize> {
        let parent = self.node(id).parent?;
        self.node(parent).children.iter().position(|&c| c == id)
    }

    /// Returns true if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).parent;
        }
        false
    }

    /// Attaches `child` under `parent` at `row` (append when `None` or past
    /// the end), detaching it from any previous parent first.
    ///
    /// Returns the row the child ended up at.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale, if `child` is a root node or if the
    /// move would make a node its own ancestor.
    pub fn add(&mut self, parent: NodeId, child: NodeId, row: Option<usize>) -> usize {
        assert!(
            self.node(child).kind() != NodeKind::Root,
            "a root node cannot be inserted as a child"
        );
        assert!(
            !self.is_ancestor(child, parent),
            "cannot insert a node below itself"
        );

        self.detach(child);

        let siblings = &mut self.node_mut(parent).children;
        let row = row.map_or(siblings.len(), |r| r.min(siblings.len()));
        siblings.insert(row, child);
        self.node_mut(child).parent = Some(parent);
        row
    }

    /// Detaches `child` from `parent` without freeing it.
    ///
    /// Returns the row it was removed from, or `None` if `child` was not a
    /// child of `parent`.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Option<usize> {
        let siblings = &mut self.node_mut(parent).children;
        let row = siblings.iter().position(|&c| c == child)?;
        siblings.remove(row);
        self.node_mut(child).parent = None;
        Some(row)
    }

    /// Detaches `id` from whatever parent it has.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.node(id).parent?;
        self.remove(parent, id)
    }

    /// Frees `id` and its whole subtree, returning the number of nodes
    /// released. Stale ids free nothing.
    ///
    /// # Panics
    ///
    /// Panics if the node is still attached or is the tree root.
    pub fn free(&mut self, id: NodeId) -> usize {
        let Some(node) = self.get(id) else {
            return 0;
        };
        assert!(node.parent.is_none(), "cannot free an attached node");
        assert!(id != self.root, "cannot free the tree root");

        let mut stack = vec![id];
        let mut count = 0;
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                self.free_slots.push(current.index);
                count += 1;
            }
        }
        self.live -= count;
        count
    }

    /// Deep-copies the subtree at `id` of `other` into this tree as a
    /// detached subtree.
    pub fn graft(&mut self, other: &FilterTree, id: NodeId) -> NodeId {
        let source = other.node(id);
        let copy = self.insert_detached(source.clone());
        for &child in &source.children {
            let child_copy = self.graft(other, child);
            self.add(copy, child_copy, None);
        }
        copy
    }

    /// Deep-copies the subtree at `id` into a new tree.
    ///
    /// A root-kind node becomes the new tree's root; any other node is
    /// attached as the root's only child.
    pub fn extract(&self, id: NodeId) -> FilterTree {
        let mut tree = FilterTree::new();
        if self.node(id).kind() == NodeKind::Root {
            let root = tree.root;
            for &child in self.children(id) {
                let copy = tree.graft(self, child);
                tree.add(root, copy, None);
            }
        } else {
            let copy = tree.graft(self, id);
            tree.add(tree.root, copy, None);
        }
        tree
    }

    /// Compares the subtree at `a` with the subtree at `b` of `other`.
    ///
    /// Fields and children are compared recursively in order.
    pub fn subtree_eq(&self, a: NodeId, other: &FilterTree, b: NodeId) -> bool {
        let (left, right) = (self.node(a), other.node(b));
        left.same_fields(right)
            && left.children.len() == right.children.len()
            && left
                .children
                .iter()
                .zip(&right.children)
                .all(|(&l, &r)| self.subtree_eq(l, other, r))
    }

    /// Iterates the subtree at `id` depth-first in pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants { tree: self, stack: vec![id] }
    }

    /// Slash-joined title path of `id`, stopping below the root folder.
    ///
    /// The root folder itself and the root yield an empty path.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut titles = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            if matches!(node.kind(), NodeKind::Root | NodeKind::RootFolder) {
                break;
            }
            titles.push(node.title.as_str());
            cursor = node.parent;
        }
        titles.reverse();
        titles.join(&PATH_SEPARATOR.to_string())
    }

    /// Resolves a path produced by [`FilterTree::path_of`].
    ///
    /// Matching starts below the root folder and follows the first child
    /// with each title. An empty or broken path resolves to the root
    /// folder; `None` only when the tree has no root folder.
    pub fn resolve_path(&self, path: &str) -> Option<NodeId> {
        let root_folder = self.root_folder()?;
        if path.is_empty() {
            return Some(root_folder);
        }

        let mut current = root_folder;
        for title in path.split(PATH_SEPARATOR) {
            let next = self
                .children(current)
                .iter()
                .copied()
                .find(|&c| self.node(c).title == title);
            match next {
                Some(next) => current = next,
                None => return Some(root_folder),
            }
        }
        Some(current)
    }
}

impl PartialEq for FilterTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a FilterTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

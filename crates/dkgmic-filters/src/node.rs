//! Filter hierarchy entries.
//!
//! A [`Node`] is one entry of the hierarchy: the invisible root, the
//! user-visible root folder, a folder, a filter item or a separator.
//! Nodes live inside a [`FilterTree`](crate::FilterTree) and are addressed
//! by [`NodeId`].

use chrono::NaiveDateTime;

/// Kind of a hierarchy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// Invisible top-level container. Never a child.
    #[default]
    Root,
    /// User folder.
    Folder,
    /// One or more chained filter commands under a title.
    Item,
    /// Visual separator.
    Separator,
    /// The top-level folder shown to the user.
    RootFolder,
}

impl NodeKind {
    /// Returns true for kinds that hold children.
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Root | Self::Folder | Self::RootFolder)
    }

    /// Returns true for kinds a view can expand and drop into.
    pub const fn is_folder(self) -> bool {
        matches!(self, Self::Folder | Self::RootFolder)
    }

    /// Short label used by text front ends.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Folder => "folder",
            Self::Item => "item",
            Self::Separator => "separator",
            Self::RootFolder => "root-folder",
        }
    }
}

/// Stable handle to a node inside a [`FilterTree`](crate::FilterTree).
///
/// The generation counter keeps handles to freed nodes from resolving to
/// a node allocated later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Insertion-ordered map from sub-filter name to G'MIC command.
///
/// Inserting an existing name replaces its command in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCommands {
    entries: Vec<(String, String)>,
}

impl FilterCommands {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from the parallel `names` / `filters` lists of the
    /// XML database. Returns `None` when the lists differ in length.
    pub fn from_lists<N, F>(names: &[N], filters: &[F]) -> Option<Self>
    where
        N: AsRef<str>,
        F: AsRef<str>,
    {
        if names.len() != filters.len() {
            return None;
        }

        Some(
            names
                .iter()
                .zip(filters)
                .map(|(n, f)| (n.as_ref(), f.as_ref()))
                .collect(),
        )
    }

    /// Inserts or replaces a command.
    pub fn insert(&mut self, name: impl Into<String>, command: impl Into<String>) {
        let name = name.into();
        let command = command.into();

        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = command,
            None => self.entries.push((name, command)),
        }
    }

    /// Returns the command registered under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }

    /// Removes `name`, returning its command.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Number of chained commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no commands.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, command)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    /// Sub-filter names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Commands in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, c)| c.as_str())
    }

    /// The effective command line: all commands joined by a space.
    pub fn chained(&self) -> String {
        self.values()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

impl<N: Into<String>, C: Into<String>> FromIterator<(N, C)> for FilterCommands {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        let mut commands = Self::new();
        for (name, command) in iter {
            commands.insert(name, command);
        }
        commands
    }
}

/// One entry of the filter hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    /// Display name.
    pub title: String,
    /// Free-text comment (items).
    pub description: String,
    /// Chained G'MIC commands (items).
    pub commands: FilterCommands,
    /// Creation time (items).
    pub date_added: Option<NaiveDateTime>,
    /// Whether the subtree is shown expanded.
    pub expanded: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// Creates a detached node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            title: String::new(),
            description: String::new(),
            commands: FilterCommands::new(),
            date_added: None,
            expanded: true,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Creates a folder with a title.
    pub fn folder(title: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Folder);
        node.title = title.into();
        node
    }

    /// Creates a filter item.
    pub fn item(title: impl Into<String>, commands: FilterCommands) -> Self {
        let mut node = Self::new(NodeKind::Item);
        node.title = title.into();
        node.commands = commands;
        node
    }

    /// Creates a separator.
    pub fn separator() -> Self {
        Self::new(NodeKind::Separator)
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the creation time.
    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date_added = Some(date);
        self
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Parent node, `None` when detached or for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Compares the payload fields, ignoring links.
    pub(crate) fn same_fields(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.title == other.title
            && self.description == other.description
            && self.commands == other.commands
            && self.date_added == other.date_added
            && self.expanded == other.expanded
    }
}

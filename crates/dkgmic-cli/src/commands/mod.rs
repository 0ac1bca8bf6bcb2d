//! CLI command implementations

pub mod edit;
pub mod list;
pub mod show;
pub mod transfer;

use anyhow::{bail, Context, Result};
use dkgmic_filters::{FilterManager, NodeId, NodeKind, PATH_SEPARATOR};
use std::path::Path;

/// Opens and loads the filter database.
///
/// A missing file yields the default hierarchy; a corrupt one is an error
/// so that saving never overwrites it.
pub fn open_manager(db: &Path) -> Result<FilterManager> {
    let mut manager = FilterManager::new(db);
    manager
        .load()
        .with_context(|| format!("Failed to load: {}", db.display()))?;
    Ok(manager)
}

/// Saves the database.
pub fn save(manager: &FilterManager) -> Result<()> {
    manager
        .save()
        .with_context(|| format!("Failed to save: {}", manager.file().display()))
}

/// Looks up an entry by its slash-separated title path. The empty path is
/// the root folder.
pub fn find_node(manager: &FilterManager, path: &str) -> Result<NodeId> {
    let path = path.trim_matches(PATH_SEPARATOR);
    let tree = manager.tree();

    match tree.resolve_path(path) {
        Some(id) if tree.path_of(id) == path => Ok(id),
        Some(_) => bail!("No such entry: '{}'", path),
        None => bail!("The filter database has no root folder"),
    }
}

/// Looks up a folder by path.
pub fn find_folder(manager: &FilterManager, path: &str) -> Result<NodeId> {
    let id = find_node(manager, path)?;
    if !manager.tree().node(id).kind().is_folder() {
        bail!("'{}' is not a folder", path);
    }
    Ok(id)
}

/// One-letter tag shown in listings.
pub fn kind_tag(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Root | NodeKind::RootFolder => "#",
        NodeKind::Folder => "+",
        NodeKind::Item => "*",
        NodeKind::Separator => "-",
    }
}

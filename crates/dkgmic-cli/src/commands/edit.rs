//! Commands editing the hierarchy. Every command saves the database.

use crate::{AddFilterArgs, AddFolderArgs, AddSeparatorArgs, CommentArgs, PathArgs, RenameArgs};
use anyhow::{bail, Context, Result};
use dkgmic_filters::{FilterDraft, FilterManager, Node, NodeKind};
use tracing::info;

use super::{find_folder, find_node, save};

/// Adds a folder.
pub fn run_add_folder(args: AddFolderArgs, manager: &mut FilterManager) -> Result<()> {
    let parent = find_folder(manager, &args.parent)?;
    let mut draft = FilterDraft::new_folder(parent);
    draft.title = args.title;

    let id = draft.accept(manager).context("Failed to add folder")?;
    println!("Added folder '{}'", manager.path_of(id));
    Ok(())
}

/// Adds a filter from `name=command` pairs.
pub fn run_add_filter(args: AddFilterArgs, manager: &mut FilterManager) -> Result<()> {
    let parent = find_folder(manager, &args.parent)?;
    let mut draft = FilterDraft::new_filter(parent);
    draft.title = args.title;
    draft.description = args.desc;

    for spec in &args.commands {
        let (name, command) = parse_command(spec)?;
        draft.chain.create_new_filter(name, command);
    }

    let id = draft.accept(manager).context("Failed to add filter")?;
    println!("Added filter '{}'", manager.path_of(id));
    Ok(())
}

/// Appends a separator.
pub fn run_add_separator(args: AddSeparatorArgs, manager: &mut FilterManager) -> Result<()> {
    let parent = find_folder(manager, &args.parent)?;
    let id = manager.create_entry(Node::separator());
    manager.add_entry(parent, id, None);
    save(manager)?;
    println!("Added separator");
    Ok(())
}

/// Removes a filter, folder or separator.
pub fn run_remove(args: PathArgs, manager: &mut FilterManager) -> Result<()> {
    let id = find_node(manager, &args.path)?;
    match manager.tree().node(id).kind() {
        NodeKind::Item | NodeKind::Folder | NodeKind::Separator => {}
        NodeKind::Root | NodeKind::RootFolder => bail!("The root folder cannot be removed"),
    }

    manager.remove_entry(id);
    save(manager)?;
    info!(path = %args.path, "removed entry");
    println!("Removed '{}'", args.path);
    Ok(())
}

/// Renames a filter or folder.
pub fn run_rename(args: RenameArgs, manager: &mut FilterManager) -> Result<()> {
    let id = find_node(manager, &args.path)?;
    match manager.tree().node(id).kind() {
        NodeKind::Item | NodeKind::Folder => {}
        NodeKind::Separator => bail!("Separators have no title"),
        NodeKind::Root | NodeKind::RootFolder => bail!("The root folder cannot be renamed"),
    }

    let mut draft = FilterDraft::edit(manager, id);
    draft.title = args.title;
    draft.accept(manager).context("Failed to rename")?;
    println!("Renamed to '{}'", manager.path_of(id));
    Ok(())
}

/// Sets the description of a filter.
pub fn run_comment(args: CommentArgs, manager: &mut FilterManager) -> Result<()> {
    let id = find_node(manager, &args.path)?;
    if manager.tree().node(id).kind() != NodeKind::Item {
        bail!("'{}' is not a filter", args.path);
    }

    let mut draft = FilterDraft::edit(manager, id);
    draft.description = args.text;
    draft.accept(manager).context("Failed to set the description")?;
    Ok(())
}

/// Splits `name=command`.
fn parse_command(spec: &str) -> Result<(&str, &str)> {
    let Some((name, command)) = spec.split_once('=') else {
        bail!("Expected name=command, got '{}'", spec);
    };
    let (name, command) = (name.trim(), command.trim());
    if name.is_empty() || command.is_empty() {
        bail!("Expected name=command, got '{}'", spec);
    }
    Ok((name, command))
}

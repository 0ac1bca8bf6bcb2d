//! Read-only views of single entries and the current selection.

use crate::{ChainArgs, CurrentArgs, PathArgs};
use anyhow::{bail, Result};
use dkgmic_bqm::ToolSettings;
use dkgmic_filters::{FilterChain, FilterManager, NodeId, NodeKind};

use super::{find_node, save};

/// Prints the chained command of a filter.
pub fn run_chain(args: ChainArgs, manager: &FilterManager) -> Result<()> {
    let id = find_node(manager, &args.path)?;
    let node = manager.tree().node(id);
    if node.kind() != NodeKind::Item {
        bail!("'{}' is not a filter", args.path);
    }

    if args.list {
        let chain = FilterChain::from_commands(&node.commands);
        for (row, entry) in chain.entries().iter().enumerate() {
            println!("{:>3}. {}: {}", row + 1, entry.title, entry.command);
        }
    }
    println!("{}", node.commands.chained());
    Ok(())
}

/// Prints every field of an entry.
pub fn run_show(args: PathArgs, manager: &FilterManager) -> Result<()> {
    let id = find_node(manager, &args.path)?;
    for line in describe(manager, id) {
        println!("{line}");
    }
    Ok(())
}

fn describe(manager: &FilterManager, id: NodeId) -> Vec<String> {
    let tree = manager.tree();
    let node = tree.node(id);

    let mut lines = vec![
        format!("Path:        {}", tree.path_of(id)),
        format!("Kind:        {}", node.kind().label()),
    ];
    if node.kind() != NodeKind::Separator {
        lines.push(format!("Title:       {}", node.title));
    }
    if !node.description.is_empty() {
        lines.push(format!("Description: {}", node.description));
    }
    if let Some(date) = node.date_added {
        lines.push(format!("Added:       {}", date.format("%Y-%m-%d %H:%M:%S")));
    }
    if node.kind().is_folder() {
        lines.push(format!("Entries:     {}", node.children().len()));
        lines.push(format!("Expanded:    {}", if node.expanded { "yes" } else { "no" }));
    }
    for (name, command) in node.commands.iter() {
        lines.push(format!("  {name}: {command}"));
    }
    lines
}

/// Prints the current selection, after moving it to `path` if given.
pub fn run_current(args: CurrentArgs, manager: &mut FilterManager) -> Result<()> {
    if let Some(path) = args.path {
        let id = find_node(manager, &path)?;
        let path = manager.path_of(id);
        manager.set_current_path(path);
        save(manager)?;
    }

    let settings = ToolSettings::from_selection(manager);
    println!("Path:    {}", settings.path);
    println!("Command: {}", settings.command);
    Ok(())
}

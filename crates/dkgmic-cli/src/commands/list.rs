//! Hierarchy listing, optionally filtered by title.

use crate::ListArgs;
use anyhow::Result;
use dkgmic_filters::{FilterManager, FilterModel, ItemData, ModelIndex, Role, TreeProxy};

/// Prints the rows accepted by the title filter as an indented tree.
pub fn run(args: ListArgs, manager: &mut FilterManager) -> Result<()> {
    let model = FilterModel::new(manager);
    let mut proxy = TreeProxy::new();
    if let Some(filter) = &args.filter {
        proxy.set_filter_fixed_string(filter);
    }

    if !proxy.accepts_any(&model, manager) {
        println!("No filter matches '{}'", proxy.filter());
        return Ok(());
    }

    for line in render(&model, manager, &proxy, args.commands) {
        println!("{line}");
    }
    Ok(())
}

/// Listing lines for every accepted row.
fn render(model: &FilterModel, manager: &FilterManager, proxy: &TreeProxy, commands: bool) -> Vec<String> {
    let mut lines = Vec::new();
    render_rows(model, manager, proxy, None, 0, commands, &mut lines);
    lines
}

fn render_rows(
    model: &FilterModel,
    manager: &FilterManager,
    proxy: &TreeProxy,
    parent: Option<ModelIndex>,
    depth: usize,
    commands: bool,
    lines: &mut Vec<String>,
) {
    for row in 0..model.row_count(manager, parent) {
        if !proxy.filter_accepts_row(model, manager, row, parent) {
            continue;
        }
        let Some(index) = model.index(manager, row, 0, parent) else {
            continue;
        };

        lines.push(format_row(model, manager, index, depth, commands));
        render_rows(model, manager, proxy, Some(index), depth + 1, commands, lines);
    }
}

fn format_row(model: &FilterModel, manager: &FilterManager, index: ModelIndex, depth: usize, commands: bool) -> String {
    let indent = "  ".repeat(depth);
    let kind = match model.data(manager, index, Role::Kind) {
        Some(ItemData::Kind(kind)) => kind,
        _ => return format!("{indent}?"),
    };
    if matches!(model.data(manager, index, Role::Separator), Some(ItemData::Bool(true))) {
        return format!("{indent}{} ----", super::kind_tag(kind));
    }

    let mut line = format!("{indent}{} {}", super::kind_tag(kind), text(model, manager, index));
    if let Some(comment) = model
        .index(manager, index.row(), 1, model.parent(manager, index))
        .map(|i| text(model, manager, i))
        .filter(|c| !c.is_empty())
    {
        line.push_str(&format!("  ({comment})"));
    }
    if commands {
        if let Some(ItemData::Commands(cmds)) = model.data(manager, index, Role::Command) {
            if !cmds.is_empty() {
                line.push_str(&format!("  => {}", cmds.chained()));
            }
        }
    }
    line
}

fn text(model: &FilterModel, manager: &FilterManager, index: ModelIndex) -> String {
    match model.data(manager, index, Role::Display) {
        Some(ItemData::Text(text)) => text,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dkgmic_filters::{FilterCommands, Node};

    #[test]
    fn filtered_listing() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = crate::commands::open_manager(&dir.path().join("db.xml")).unwrap();
        let rf = manager.tree().root_folder().unwrap();

        let portrait = manager.create_entry(Node::folder("Portrait"));
        manager.add_entry(rf, portrait, None);
        let commands: FilterCommands = [("s", "fx_unsharp 1")].into_iter().collect();
        let sharpen = manager.create_entry(Node::item("Sharpen", commands).with_description("crisp"));
        manager.add_entry(portrait, sharpen, None);
        let sep = manager.create_entry(Node::separator());
        manager.add_entry(rf, sep, None);

        let model = FilterModel::new(&mut manager);
        let all = render(&model, &manager, &TreeProxy::new(), true);
        assert_eq!(
            all,
            [
                "# My G'MIC Filters",
                "  + Portrait",
                "    * Sharpen  (crisp)  => fx_unsharp 1",
                "  - ----",
            ]
        );

        let mut proxy = TreeProxy::new();
        proxy.set_filter_fixed_string("sharp");
        let some = render(&model, &manager, &proxy, false);
        assert_eq!(some, ["# My G'MIC Filters", "  + Portrait", "    * Sharpen  (crisp)"]);
    }
}

//! G'MIC filters database writer.
//!
//! Mirrors [`reader`](crate::reader): when given the tree root, the
//! children of its first child (the root folder) are written directly under
//! `<gmic>`, so the synthetic folder added on load is not persisted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::error::{FilterError, FilterResult};
use crate::node::{NodeId, NodeKind};
use crate::reader::{DATE_FORMAT, FORMAT_VERSION, STORED_PATH_SEPARATOR};
use crate::tree::{FilterTree, PATH_SEPARATOR};

/// Writes `node` of `tree` to the file at `path`.
pub fn write_filters(path: &Path, tree: &FilterTree, node: NodeId, current_path: &str) -> FilterResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_filters_to(&mut writer, tree, node, current_path)?;
    writer.flush()?;
    debug!(path = %path.display(), "filters database written");
    Ok(())
}

/// Writes `node` of `tree` as a complete document.
///
/// A root node with children is unwrapped: the children of its first child
/// are written. Any other node is written as the only body element.
pub fn write_filters_to<W: Write>(w: W, tree: &FilterTree, node: NodeId, current_path: &str) -> FilterResult<()> {
    let mut xml = Writer::new_with_indent(w, b' ', 4);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;
    xml.write_event(Event::DocType(BytesText::from_escaped("gmic")))
        .map_err(write_error)?;

    let stored_path = current_path.replace(PATH_SEPARATOR, &STORED_PATH_SEPARATOR.to_string());
    let mut start = BytesStart::new("gmic");
    start.push_attribute(("version", FORMAT_VERSION));
    start.push_attribute(("currentpath", stored_path.as_str()));
    xml.write_event(Event::Start(start)).map_err(write_error)?;

    let root = tree.node(node);
    match root.children().first() {
        Some(&first) if root.kind() == NodeKind::Root => {
            for &child in tree.children(first) {
                write_node(&mut xml, tree, child)?;
            }
        }
        _ => write_node(&mut xml, tree, node)?,
    }

    xml.write_event(Event::End(BytesEnd::new("gmic")))
        .map_err(write_error)?;
    xml.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_node<W: Write>(xml: &mut Writer<W>, tree: &FilterTree, id: NodeId) -> FilterResult<()> {
    let node = tree.node(id);

    match node.kind() {
        NodeKind::Folder => {
            let mut start = BytesStart::new("folder");
            start.push_attribute(("folded", if node.expanded { "no" } else { "yes" }));
            xml.write_event(Event::Start(start)).map_err(write_error)?;
            write_title(xml, &node.title)?;

            for &child in node.children() {
                write_node(xml, tree, child)?;
            }

            xml.write_event(Event::End(BytesEnd::new("folder")))
                .map_err(write_error)?;
        }
        NodeKind::Item => {
            let mut start = BytesStart::new("item");

            if !node.commands.is_empty() {
                let names = node.commands.names().collect::<Vec<_>>().join(";");
                let filters = node.commands.values().collect::<Vec<_>>().join(";");
                start.push_attribute(("names", names.as_str()));
                start.push_attribute(("filters", filters.as_str()));
            }

            if let Some(date) = node.date_added {
                start.push_attribute(("added", date.format(DATE_FORMAT).to_string().as_str()));
            }

            if !node.description.is_empty() {
                start.push_attribute(("desc", node.description.as_str()));
            }

            xml.write_event(Event::Start(start)).map_err(write_error)?;
            write_title(xml, &node.title)?;
            xml.write_event(Event::End(BytesEnd::new("item")))
                .map_err(write_error)?;
        }
        NodeKind::Separator => {
            xml.write_event(Event::Empty(BytesStart::new("separator")))
                .map_err(write_error)?;
        }
        NodeKind::Root | NodeKind::RootFolder => {}
    }

    Ok(())
}

fn write_title<W: Write>(xml: &mut Writer<W>, title: &str) -> FilterResult<()> {
    xml.write_event(Event::Start(BytesStart::new("title")))
        .map_err(write_error)?;
    xml.write_event(Event::Text(BytesText::new(title)))
        .map_err(write_error)?;
    xml.write_event(Event::End(BytesEnd::new("title")))
        .map_err(write_error)?;
    Ok(())
}

fn write_error(e: impl std::fmt::Display) -> FilterError {
    FilterError::Write(e.to_string())
}

//! G'MIC filters database reader.
//!
//! The database is a small XML dialect:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!DOCTYPE gmic>
//! <gmic version="2.0" currentpath="Portrait|Sharpen">
//!     <folder folded="no">
//!         <title>Portrait</title>
//!         <item names="a;b" filters="fx_a;fx_b" added="2024-01-02T03:04:05" desc="...">
//!             <title>Sharpen</title>
//!         </item>
//!         <separator/>
//!     </folder>
//! </gmic>
//! ```
//!
//! The `currentpath` attribute stores the current-path with `|` in place of
//! `/`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace};

use crate::error::{FilterError, FilterResult};
use crate::node::{FilterCommands, Node, NodeId, NodeKind};
use crate::tree::FilterTree;

/// Supported database version.
pub const FORMAT_VERSION: &str = "2.0";

/// Title of the synthetic root folder.
pub const DEFAULT_ROOT_FOLDER_TITLE: &str = "My G'MIC Filters";

/// Title given to items stored without one.
pub const UNKNOWN_ITEM_TITLE: &str = "Unknown item";

/// On-disk timestamp format.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// On-disk replacement for the current-path separator.
pub(crate) const STORED_PATH_SEPARATOR: char = '|';

/// A parsed database.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDocument {
    /// The hierarchy.
    pub tree: FilterTree,
    /// Current path, with `/` separators.
    pub current_path: String,
}

impl FilterDocument {
    /// First-run document: root, one root folder, empty current path.
    pub fn skeleton() -> Self {
        Self {
            tree: FilterTree::with_root_folder(DEFAULT_ROOT_FOLDER_TITLE),
            current_path: String::new(),
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Reads the database at `path` below a synthetic root folder.
///
/// A missing or unreadable file yields [`FilterDocument::skeleton`]. Parse
/// errors are returned.
pub fn read_filters(path: &Path) -> FilterResult<FilterDocument> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "filters database not readable, using defaults");
            return Ok(FilterDocument::skeleton());
        }
    };

    let mut text = String::new();
    if let Err(e) = file.read_to_string(&mut text) {
        debug!(path = %path.display(), error = %e, "filters database not readable, using defaults");
        return Ok(FilterDocument::skeleton());
    }

    parse_filters_str(&text, true)
}

/// Parses a database from any reader.
///
/// With `add_root_folder`, the document body is read below a new root
/// folder titled [`DEFAULT_ROOT_FOLDER_TITLE`]; otherwise directly below the
/// root.
pub fn parse_filters<R: Read>(mut reader: R, add_root_folder: bool) -> FilterResult<FilterDocument> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_filters_str(&text, add_root_folder)
}

/// Parses a database held in memory.
pub fn parse_filters_str(text: &str, add_root_folder: bool) -> FilterResult<FilterDocument> {
    DocumentReader::new(text).read(add_root_folder)
}

// ============================================================================
// Parser
// ============================================================================

/// Open element on the parse stack.
enum Frame {
    /// `gmic` or `folder` body.
    Container { id: NodeId, folder: bool },
    /// `item` body.
    Item(NodeId),
    /// `title` text of a folder or item.
    Title { owner: NodeId, text: String },
    /// Element whose content is ignored.
    Skip,
}

struct DocumentReader<'a> {
    text: &'a str,
    xml: Reader<&'a [u8]>,
    tree: FilterTree,
    current_path: String,
    stack: Vec<Frame>,
}

impl<'a> DocumentReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            xml: Reader::from_str(text),
            tree: FilterTree::new(),
            current_path: String::new(),
            stack: Vec::new(),
        }
    }

    fn read(mut self, add_root_folder: bool) -> FilterResult<FilterDocument> {
        let mut started = false;

        loop {
            let event = match self.xml.read_event() {
                Ok(event) => event,
                Err(e) => {
                    let position = self.xml.error_position();
                    return Err(self.error_at(position, e.to_string()));
                }
            };

            match event {
                Event::Start(e) if !started => {
                    started = true;
                    let base = self.open_document(&e, add_root_folder)?;
                    self.stack.push(Frame::Container { id: base, folder: false });
                }
                Event::Empty(e) if !started => {
                    self.open_document(&e, add_root_folder)?;
                    break;
                }
                Event::Start(e) => {
                    let frame = self.open(&e)?;
                    self.stack.push(frame);
                }
                Event::Empty(e) => {
                    let frame = self.open(&e)?;
                    self.close(frame);
                }
                Event::End(_) => {
                    if let Some(frame) = self.stack.pop() {
                        self.close(frame);
                    }
                    if self.stack.is_empty() {
                        break;
                    }
                }
                Event::Text(e) if self.in_title() => {
                    let decoded = e.decode().map_err(|err| self.error(err.to_string()))?;
                    self.push_title_text(&decoded);
                }
                Event::CData(e) if self.in_title() => {
                    self.push_title_text(&String::from_utf8_lossy(&e));
                }
                Event::GeneralRef(e) if self.in_title() => {
                    let resolved = match e.resolve_char_ref() {
                        Ok(Some(ch)) => ch.to_string(),
                        Ok(None) => {
                            let name = e.decode().map_err(|err| self.error(err.to_string()))?;
                            match quick_xml::escape::resolve_predefined_entity(&name) {
                                Some(value) => value.to_string(),
                                None => return Err(self.error(format!("unknown entity &{name};"))),
                            }
                        }
                        Err(err) => return Err(self.error(err.to_string())),
                    };
                    self.push_title_text(&resolved);
                }
                Event::Eof => {
                    return Err(self.error("premature end of document"));
                }
                _ => {}
            }
        }

        debug!(nodes = self.tree.len(), current_path = %self.current_path, "filters database parsed");

        Ok(FilterDocument {
            tree: self.tree,
            current_path: self.current_path,
        })
    }

    fn in_title(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Title { .. }))
    }

    fn push_title_text(&mut self, chunk: &str) {
        if let Some(Frame::Title { text, .. }) = self.stack.last_mut() {
            text.push_str(chunk);
        }
    }

    /// Validates the `gmic` element and prepares the node the body goes under.
    fn open_document(&mut self, e: &BytesStart, add_root_folder: bool) -> FilterResult<NodeId> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        if name != "gmic" {
            return Err(FilterError::UnexpectedRoot(name));
        }

        let version = self.attr(e, "version")?.unwrap_or_default();
        if !version.is_empty() && version != FORMAT_VERSION {
            return Err(FilterError::UnsupportedVersion(version));
        }

        self.current_path = self
            .attr(e, "currentpath")?
            .unwrap_or_default()
            .replace(STORED_PATH_SEPARATOR, "/");

        let root = self.tree.root();
        if add_root_folder {
            let mut folder = Node::new(NodeKind::RootFolder);
            folder.title = DEFAULT_ROOT_FOLDER_TITLE.to_string();
            let folder = self.tree.insert_detached(folder);
            self.tree.add(root, folder, None);
            Ok(folder)
        } else {
            Ok(root)
        }
    }

    /// Handles a start tag below the document element.
    fn open(&mut self, e: &BytesStart) -> FilterResult<Frame> {
        let name = e.name();
        let name = name.as_ref();

        let frame = match self.stack.last() {
            Some(&Frame::Container { id: parent, folder }) => match name {
                b"folder" => {
                    let mut node = Node::new(NodeKind::Folder);
                    node.expanded = self.attr(e, "folded")?.as_deref() == Some("no");
                    let id = self.tree.insert_detached(node);
                    self.tree.add(parent, id, None);
                    Frame::Container { id, folder: true }
                }
                b"item" => {
                    let node = self.read_item(e)?;
                    let id = self.tree.insert_detached(node);
                    self.tree.add(parent, id, None);
                    Frame::Item(id)
                }
                b"separator" => {
                    let id = self.tree.insert_detached(Node::separator());
                    self.tree.add(parent, id, None);
                    Frame::Skip
                }
                b"title" if folder => Frame::Title { owner: parent, text: String::new() },
                _ => Frame::Skip,
            },
            Some(&Frame::Item(owner)) if name == b"title" => {
                Frame::Title { owner, text: String::new() }
            }
            _ => Frame::Skip,
        };

        if matches!(frame, Frame::Skip) {
            trace!(element = %String::from_utf8_lossy(name), "skipping element");
        }

        Ok(frame)
    }

    /// Finishes an element.
    fn close(&mut self, frame: Frame) {
        match frame {
            Frame::Title { owner, text } => {
                self.tree.node_mut(owner).title = text;
            }
            Frame::Item(id) => {
                let node = self.tree.node_mut(id);
                if node.title.is_empty() {
                    node.title = UNKNOWN_ITEM_TITLE.to_string();
                }
            }
            Frame::Container { .. } | Frame::Skip => {}
        }
    }

    fn read_item(&self, e: &BytesStart) -> FilterResult<Node> {
        let mut node = Node::new(NodeKind::Item);

        let names = split_list(self.attr(e, "names")?);
        let filters = split_list(self.attr(e, "filters")?);
        match FilterCommands::from_lists(&names, &filters) {
            Some(commands) => node.commands = commands,
            None => {
                debug!(names = names.len(), filters = filters.len(), "mismatched command lists, item left without commands");
            }
        }

        node.date_added = self.attr(e, "added")?.as_deref().and_then(parse_date);
        node.description = self.attr(e, "desc")?.unwrap_or_default();

        Ok(node)
    }

    fn attr(&self, e: &BytesStart, key: &str) -> FilterResult<Option<String>> {
        let attr = e
            .try_get_attribute(key)
            .map_err(|err| self.error(err.to_string()))?;

        match attr {
            Some(attr) => {
                let value = attr
                    .unescape_value()
                    .map_err(|err| self.error(err.to_string()))?;
                Ok(Some(value.into_owned()))
            }
            None => Ok(None),
        }
    }

    fn error(&self, message: impl Into<String>) -> FilterError {
        self.error_at(self.xml.buffer_position(), message)
    }

    fn error_at(&self, position: u64, message: impl Into<String>) -> FilterError {
        let (line, column) = line_column(self.text, position);
        FilterError::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Converts a byte offset into a 1-based line and column.
fn line_column(text: &str, position: u64) -> (u64, u64) {
    let end = (position as usize).min(text.len());
    let prefix = &text.as_bytes()[..end];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = prefix.iter().rposition(|&b| b == b'\n').map_or(0, |p| p + 1);
    (line as u64, (end - line_start + 1) as u64)
}

/// Splits a `;`-joined list. A present but empty attribute is one empty
/// entry; only an absent attribute is an empty list.
fn split_list(value: Option<String>) -> Vec<String> {
    match value {
        Some(value) => value.split(';').map(str::to_string).collect(),
        None => Vec::new(),
    }
}

/// Parses an ISO 8601 timestamp, with or without an offset.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.naive_local()))
}

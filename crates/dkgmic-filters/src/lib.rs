//! # dkgmic-filters
//!
//! Hierarchy of user-defined G'MIC filters for the digiKam G'MIC tools.
//!
//! Filters are organised in a tree of folders, filter items and
//! separators below a single root folder. The tree is persisted as an XML
//! database (`gmicfilters.xml`, format version 2.0), edited through an
//! undo stack and exposed to views through a row/column model with drag
//! and drop and search filtering.
//!
//! # Node Kinds
//!
//! - [`NodeKind::Root`] - invisible tree root
//! - [`NodeKind::RootFolder`] - the single top-level folder
//! - [`NodeKind::Folder`] - user folder
//! - [`NodeKind::Item`] - a filter: named G'MIC commands run as a chain
//! - [`NodeKind::Separator`] - visual divider
//!
//! # Usage
//!
//! ```rust,no_run
//! use dkgmic_filters::{FilterCommands, FilterManager, Node};
//!
//! let mut manager = FilterManager::new("/tmp/gmicfilters.xml");
//! let root_folder = manager.commands();
//! let folder = manager.tree().root_folder().unwrap_or(root_folder);
//!
//! let commands: FilterCommands = [("blur", "fx_blur 2")].into_iter().collect();
//! let item = manager.create_entry(Node::item("Soft", commands));
//! manager.add_entry(folder, item, None);
//! manager.save().unwrap();
//!
//! manager.undo();
//! ```
//!
//! # Modules
//!
//! - [`tree`] - arena tree and path lookup
//! - [`reader`] / [`writer`] - XML database format
//! - [`undo`] - undoable commands and the undo stack
//! - [`manager`] - database owner and edit entry point
//! - [`model`] / [`proxy`] - view adapter and row filters
//! - [`chain`] / [`draft`] - add/edit form state
//!
//! # Dependencies
//!
//! - [`quick-xml`] - database reading and writing
//! - [`chrono`] - creation dates
//! - [`thiserror`] - Error handling
//! - [`tracing`] - Logging

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod node;
pub mod chain;
pub mod draft;
pub mod manager;
pub mod model;
pub mod proxy;
pub mod reader;
pub mod tree;
pub mod undo;
pub mod writer;

pub use error::{FilterError, FilterResult};
pub use node::{FilterCommands, Node, NodeId, NodeKind};
pub use tree::{FilterTree, PATH_SEPARATOR};
pub use reader::{parse_filters, parse_filters_str, read_filters, FilterDocument};
pub use writer::{write_filters, write_filters_to};
pub use undo::{FieldValue, FilterCommand, FilterField, TreeEvent, UndoStack};
pub use manager::{default_database_path, FilterManager};
pub use model::{DropAction, FilterModel, ItemData, ItemFlags, MimeData, ModelEvent, ModelIndex, Role};
pub use proxy::{FolderProxy, TreeProxy};
pub use chain::{ChainEntry, FilterChain};
pub use draft::FilterDraft;

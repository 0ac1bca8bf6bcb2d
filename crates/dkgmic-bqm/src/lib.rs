//! # dkgmic-bqm
//!
//! Batch queue tool running a G'MIC command on queued images.
//!
//! The tool takes the chained command of the filter selected in the
//! [`dkgmic_filters`] hierarchy, hands the host image to an external
//! [`FilterEngine`] on a worker thread and writes the result back with an
//! edit history record.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dkgmic_bqm::{BqmTool, ToolSettings};
//!
//! let mut tool = BqmTool::new(Arc::new(engine));
//! tool.set_settings(ToolSettings {
//!     command: "fx_sepia 1".into(),
//!     path: "Portrait/Warm".into(),
//! });
//! tool.tool_operations(&mut host)?;
//! ```
//!
//! # Dependencies
//!
//! - [`dkgmic-filters`] - filter hierarchy and current selection
//! - [`serde`] / [`serde_yaml`] - tool settings and history records
//! - [`thiserror`] - Error handling
//! - [`tracing`] - Logging

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod action;
pub mod buffer;
pub mod engine;
pub mod host;
pub mod processor;
pub mod settings;
pub mod tool;

pub use error::{BqmError, BqmResult};
pub use action::{gmic_filter_action, ActionValue, FilterAction};
pub use buffer::{engine_to_host, host_to_engine, EngineImage, HostImage, HostPixels};
pub use engine::{EngineJob, EngineOutcome, FilterEngine, InputMode, JobControl, OutputMessageMode, OutputMode};
pub use host::{BatchHost, QueuePreview, QueueSource};
pub use processor::BqmProcessor;
pub use settings::{default_settings_path, ToolSettings};
pub use tool::BqmTool;

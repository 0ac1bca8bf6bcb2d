//! Filter database error types.

use thiserror::Error;

/// Result type for filter hierarchy operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while reading, writing or editing the filter hierarchy.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Malformed XML document.
    #[error("error when loading G'MIC filters on line {line}, column {column}: {message}")]
    Parse {
        /// 1-based line of the error
        line: u64,
        /// 1-based column of the error
        column: u64,
        /// Parser message
        message: String,
    },

    /// Document root is not a `gmic` element.
    #[error("the file is not a G'MIC filters database (root element <{0}>)")]
    UnexpectedRoot(String),

    /// Document version other than 2.0.
    #[error("the file is not a G'MIC filters database version 2.0 file (found version {0})")]
    UnsupportedVersion(String),

    /// Serialization failure.
    #[error("write error: {0}")]
    Write(String),

    /// Drag and drop payload could not be decoded.
    #[error("invalid drag payload: {0}")]
    Payload(String),

    /// A filter or folder was submitted without a title.
    #[error("title cannot be empty")]
    EmptyTitle,

    /// Title contains a character reserved for current paths.
    #[error("title '{0}' cannot contain '/' or '|'")]
    InvalidTitle(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

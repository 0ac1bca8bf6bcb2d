//! Batch tool error types.

use thiserror::Error;

/// Result type for batch tool operations.
pub type BqmResult<T> = Result<T, BqmError>;

/// Errors raised while running a G'MIC command on a queued image.
#[derive(Debug, Error)]
pub enum BqmError {
    /// The G'MIC command is empty.
    #[error("the G'MIC command is empty")]
    EmptyCommand,

    /// Processing was started without an input image.
    #[error("no input image to process")]
    NoInput,

    /// A job is already running on this processor.
    #[error("a G'MIC job is already running")]
    Busy,

    /// Pixel buffer does not match its declared layout.
    #[error("invalid image buffer: {0}")]
    Buffer(String),

    /// The filter engine reported a failure.
    #[error("{0}")]
    Engine(String),

    /// The job was cancelled.
    #[error("G'MIC filter execution aborted")]
    Aborted,

    /// The host could not provide or store the image.
    #[error("host error: {0}")]
    Host(String),

    /// Settings file parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

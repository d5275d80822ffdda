//! Error types for framesight

use thiserror::Error;

/// Result type alias for framesight operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification used by the analyzer to decide how an error propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unsupported raw frame (per-frame)
    Conversion,
    /// Task-internal failure (per-frame)
    Processing,
    /// Rejected configuration request (synchronous, state untouched)
    Configuration,
    /// I/O failure (config files, snapshots)
    Io,
    /// Worker/runtime failure
    Internal,
}

/// framesight error type
#[derive(Error, Debug)]
pub enum Error {
    // Frame errors
    #[error("Colorspace conversion error: {0}")]
    Conversion(String),

    #[error("Unsupported plane layout: {0}")]
    UnsupportedLayout(String),

    #[error("Processing error: {0}")]
    Processing(String),

    // Configuration errors
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Unknown parameter '{key}' for task {task}")]
    UnknownParameter { task: String, key: String },

    #[error("Invalid value for parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // Output errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Runtime errors
    #[error("Pipeline already running")]
    PipelineAlreadyRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Conversion(_) | Error::UnsupportedLayout(_) => ErrorKind::Conversion,
            Error::Processing(_) => ErrorKind::Processing,
            Error::UnknownTask(_)
            | Error::UnknownParameter { .. }
            | Error::InvalidParameter { .. }
            | Error::Config(_) => ErrorKind::Configuration,
            Error::Snapshot(_) | Error::Io(_) => ErrorKind::Io,
            Error::PipelineAlreadyRunning | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Per-frame errors drop the frame and never stall the stream
    pub fn is_per_frame(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conversion | ErrorKind::Processing)
    }

    /// Check if this error was caused by a configuration request
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

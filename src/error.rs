//! Error types for linesink.

use std::io;
use thiserror::Error;

/// Errors surfaced by a [`LineSink`](crate::LineSink).
#[derive(Debug, Error)]
pub enum SinkError {
    /// The operation is invalid for the sink's current lifecycle state,
    /// e.g. writing after commit or opening a sink twice.
    #[error("invalid sink state: {0}")]
    State(&'static str),

    /// An underlying create/write/flush/rename failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The injected line serializer rejected a record.
    #[error("line serialization failed: {0}")]
    Serialize(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Alias for `Result<T, SinkError>`.
pub type SinkResult<T> = Result<T, SinkError>;

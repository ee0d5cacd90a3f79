//! Record sink trait and errors
//!
//! The coordinator hands each finished record to a [`RecordSink`] in the order
//! the records were produced. How and where they are stored is up to the sink.

use crate::normalize::NormalizedProductRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Existing output file {path:?} cannot be appended to: {message}")]
    Existing { path: PathBuf, message: String },

    #[error("Sink is already finished")]
    Finished,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives normalized product records
pub trait RecordSink: Send {
    /// Stores one record
    fn emit(&mut self, record: NormalizedProductRecord) -> OutputResult<()>;

    /// Flushes and closes the output; called once after the last record
    fn finish(&mut self) -> OutputResult<()>;

    /// Number of records emitted so far
    fn emitted(&self) -> usize;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn emit(&mut self, record: NormalizedProductRecord) -> OutputResult<()> {
        (**self).emit(record)
    }

    fn finish(&mut self) -> OutputResult<()> {
        (**self).finish()
    }

    fn emitted(&self) -> usize {
        (**self).emitted()
    }
}

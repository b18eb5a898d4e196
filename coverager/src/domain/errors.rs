//! Structured error types for coverager
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Event handlers never return errors; these cover the report writer and the
//! replay driver only.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create report file {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {artifact} report: {source}")]
    WriteFailed {
        artifact: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Malformed event on line {line}: {source}")]
    MalformedEvent {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Worker for thread {0} terminated unexpectedly")]
    WorkerPanicked(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

//! Error types for unigen-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in unigen-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A master snapshot exists but does not have the expected shape
    #[error("invalid master snapshot '{path}': {message}")]
    SnapshotInvalid { path: PathBuf, message: String },

    /// The dataset has no records left to export
    #[error("no data to export")]
    EmptyDataset,

    /// None of the requested format identifiers resolved to a writer
    #[error("no exporters available for the requested formats: {0}")]
    NoFormats(String),

    /// Every requested format failed; nothing was written
    #[error("no output files generated: {0}")]
    NoOutputFiles(String),

    /// Output file verification failed
    #[error("verification failed for '{path}': {message}")]
    Verification { path: PathBuf, message: String },

    /// Compression failure
    #[error("failed to compress '{path}': {source}")]
    Compression {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

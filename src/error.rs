//! Error taxonomy for file operations
//!
//! Every failure the façade can report is a [`FileError`]. Read failures are
//! carried inside an [`Outcome`](crate::Outcome) as `Arc<FileError>` so the
//! same cause can be shared between a batch map and its aggregate error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::handlers::Capability;

/// Error type produced by codecs and blocking operations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for fallible façade calls
pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("no suitable {capability} file handler found for file: {}", display_name(.path))]
    NoSuitableHandler {
        capability: Capability,
        path: PathBuf,
    },

    #[error("{format} file not found: {}", .path.display())]
    FileMissing { format: &'static str, path: PathBuf },

    #[error("failed to read {format} file: {}", display_name(.path))]
    Decode {
        format: &'static str,
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("failed to write {format} file: {}", display_name(.path))]
    Encode {
        format: &'static str,
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("{handler} handler can only work with {expected}, but received {requested}")]
    TypeMismatch {
        handler: &'static str,
        expected: &'static str,
        requested: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("batch operation failed for {} of its files: {}", .failures.len(), summarize(.failures))]
    BatchAggregate {
        failures: Vec<(String, Arc<FileError>)>,
    },

    #[error("{format} task for {} did not complete: {reason}", display_name(.path))]
    TaskFailed {
        format: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("blocking batch call made from inside an async runtime; use the non-blocking variant")]
    BlockingInAsyncContext,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FileError {
    /// True for failures raised before any I/O was submitted
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            FileError::NoSuitableHandler { .. }
                | FileError::TypeMismatch { .. }
                | FileError::Configuration(_)
        )
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn summarize(failures: &[(String, Arc<FileError>)]) -> String {
    failures
        .iter()
        .map(|(key, err)| format!("{key} ({err})"))
        .collect::<Vec<_>>()
        .join(", ")
}

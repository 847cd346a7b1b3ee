//! Run-level import errors.

use crate::path::PathRejection;
use crate::source::{SourceError, SourceOpenError};

/// Errors that end an import run without a result.
///
/// Per-chunk decode failures are not here: they are recovered inside the
/// run and only show up in [`ImportResult::skipped`](crate::ImportResult::skipped).
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The path failed validation. Nothing was opened.
    #[error("invalid import path: {0}")]
    InvalidPath(#[from] PathRejection),

    /// The file exists but is not an openable container.
    #[error("failed to open construction file: {0}")]
    OpenFailed(#[from] SourceOpenError),

    /// The container lists no dimensions.
    #[error("construction file contains no dimensions")]
    NoDimensions,

    /// The configured dimension is not in the container.
    #[error("dimension {0:?} not found in construction file")]
    DimensionNotFound(String),

    /// A source-wide query failed after open.
    #[error("failed to read construction file: {0}")]
    Source(#[from] SourceError),

    /// The run was cancelled between two chunks.
    #[error("import cancelled")]
    Cancelled,
}

impl ImportError {
    /// Returns `true` for a user-requested abort, which callers usually do
    /// not report as a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

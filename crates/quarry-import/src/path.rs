//! Validation of user-supplied import paths.
//!
//! A path is checked once, before any file is opened, and the outcome is a
//! typed [`ValidPath`] or a [`PathRejection`] saying what was wrong.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// File extension of construction containers, without the dot.
pub const CONSTRUCTION_EXTENSION: &str = "construction";

/// Why a candidate path was refused.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PathRejection {
    /// No path was given.
    #[error("no construction file specified")]
    Empty,
    /// The name does not end with the expected extension.
    #[error("{path} is not a .{extension} file")]
    InvalidExtension {
        /// The rejected path.
        path: String,
        /// Extension that was expected.
        extension: String,
    },
    /// Nothing exists at the path, or it is not a regular file.
    #[error("{0} is not a file")]
    NotAFile(String),
}

/// A path string as supplied by the caller, not yet checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidatePath(String);

impl CandidatePath {
    /// Wraps a raw path string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates against [`CONSTRUCTION_EXTENSION`].
    pub fn validate(&self) -> Result<ValidPath, PathRejection> {
        self.validate_with_extension(CONSTRUCTION_EXTENSION)
    }

    /// Checks, in order: non-empty, ends with `.{extension}`, names an
    /// existing regular file.
    pub fn validate_with_extension(&self, extension: &str) -> Result<ValidPath, PathRejection> {
        if self.0.is_empty() {
            return Err(PathRejection::Empty);
        }
        let suffix = format!(".{extension}");
        if !self.0.ends_with(&suffix) {
            return Err(PathRejection::InvalidExtension {
                path: self.0.clone(),
                extension: extension.to_string(),
            });
        }
        let path = PathBuf::from(&self.0);
        if !path.is_file() {
            return Err(PathRejection::NotAFile(self.0.clone()));
        }
        Ok(ValidPath { path })
    }
}

impl From<&str> for CandidatePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A path that passed [`CandidatePath::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidPath {
    path: PathBuf,
}

impl ValidPath {
    /// The validated path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Base name of the file, for status text.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Consumes the wrapper.
    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

//! The format-reader capability the import pipeline consumes.
//!
//! A [`FormatOpener`] turns a validated path into a [`FormatSource`]. The
//! pipeline owns the source for the whole run and closes it exactly once
//! through [`OpenSource`], whichever way the run ends.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use quarry_voxel::{ChunkCoord, DecodedChunk, Dimension, SelectionGroup};
use thiserror::Error;

/// Boxed error carried by the source-level error types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The file could not be opened as a container.
#[derive(Debug, Error)]
#[error("cannot open {path}: {source}", path = .path.display())]
pub struct SourceOpenError {
    /// Path that was being opened.
    pub path: PathBuf,
    /// Underlying cause.
    #[source]
    pub source: BoxError,
}

impl SourceOpenError {
    /// Wraps `source` as a failure to open `path`.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// One chunk could not be decoded. Never fatal to an import.
#[derive(Debug, Error)]
#[error("cannot decode chunk {coord} in dimension {dimension}: {source}")]
pub struct ChunkDecodeError {
    /// Coordinate that failed.
    pub coord: ChunkCoord,
    /// Dimension it was requested from.
    pub dimension: Dimension,
    /// Underlying cause.
    #[source]
    pub source: BoxError,
}

impl ChunkDecodeError {
    /// Wraps `source` as a decode failure for `coord`.
    pub fn new(coord: ChunkCoord, dimension: Dimension, source: impl Into<BoxError>) -> Self {
        Self {
            coord,
            dimension,
            source: source.into(),
        }
    }
}

/// A source-wide query failed after the source was opened.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct SourceError {
    /// Which query failed, e.g. `"dimensions"`.
    pub operation: &'static str,
    /// Underlying cause.
    #[source]
    pub source: BoxError,
}

impl SourceError {
    /// Wraps `source` as a failure of `operation`.
    pub fn new(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

/// An open container of chunks.
pub trait FormatSource {
    /// Dimensions in file order. Expected to be non-empty.
    fn dimensions(&self) -> Result<Vec<Dimension>, SourceError>;

    /// Every chunk coordinate stored for `dimension`.
    ///
    /// The pipeline calls this once per run and never re-queries it.
    fn all_chunk_coordinates(&mut self, dimension: &Dimension) -> Result<Vec<ChunkCoord>, SourceError>;

    /// Decodes the chunk at `coord`.
    ///
    /// A failure affects this coordinate only; later calls must still work.
    fn load_chunk(&mut self, coord: ChunkCoord, dimension: &Dimension) -> Result<DecodedChunk, ChunkDecodeError>;

    /// The bounding selection recorded in the file.
    fn selection(&self) -> Result<SelectionGroup, SourceError>;

    /// Releases the underlying resources.
    fn close(&mut self);
}

/// Opens [`FormatSource`]s.
pub trait FormatOpener {
    /// The source type this opener produces.
    type Source: FormatSource;

    /// Opens the container at `path`.
    ///
    /// Fails if the path is missing, not a regular file, or not a valid
    /// container header.
    fn open(&self, path: &Path) -> Result<Self::Source, SourceOpenError>;
}

/// Owns an opened source and closes it when dropped.
pub(crate) struct OpenSource<S: FormatSource> {
    source: S,
}

impl<S: FormatSource> OpenSource<S> {
    pub(crate) fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: FormatSource> Deref for OpenSource<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: FormatSource> DerefMut for OpenSource<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FormatSource> Drop for OpenSource<S> {
    fn drop(&mut self) {
        self.source.close();
        tracing::debug!("format source closed");
    }
}

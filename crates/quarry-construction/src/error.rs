//! Errors raised while reading or writing construction containers.

use std::path::PathBuf;

use quarry_voxel::{BlockParseError, ChunkCoord, ChunkError, SectionError};

/// Errors that can occur while reading or writing a construction container.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// The underlying file could not be read or written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The path does not name a regular file.
    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    /// The data does not start with the container magic.
    #[error("invalid magic bytes")]
    InvalidMagic,

    /// The container version is not supported by this build.
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),

    /// The data ended in the middle of a field.
    #[error("data truncated while reading {0}")]
    Truncated(&'static str),

    /// A string field is not valid UTF-8.
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),

    /// A block string in a chunk palette did not parse.
    #[error("invalid block {text:?}: {source}")]
    InvalidBlock {
        /// The offending block string.
        text: String,
        /// Parse failure.
        #[source]
        source: BlockParseError,
    },

    /// A section palette entry points past the chunk palette.
    #[error("palette index {index} out of range for a palette of {len}")]
    InvalidPaletteIndex {
        /// Offending index.
        index: u32,
        /// Chunk palette length.
        len: usize,
    },

    /// The bit width byte is not one of 0, 2, 4, 8, 16.
    #[error("invalid bit width: {0}")]
    InvalidBitWidth(u8),

    /// The same section Y appears twice in one chunk.
    #[error("duplicate section {0}")]
    DuplicateSection(i32),

    /// Section data is inconsistent.
    #[error(transparent)]
    Section(#[from] SectionError),

    /// Chunk ids do not line up with the palette.
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// A chunk entry names a dimension index the header does not list.
    #[error("dimension index {0} out of range")]
    UnknownDimensionIndex(u16),

    /// The requested dimension is not in the container.
    #[error("dimension {0:?} not found")]
    UnknownDimension(String),

    /// No chunk is stored at the requested coordinate.
    #[error("no chunk at {coord} in dimension {dimension:?}")]
    MissingChunk {
        /// Requested coordinate.
        coord: ChunkCoord,
        /// Requested dimension.
        dimension: String,
    },

    /// A chunk's payload extends past the end of the file.
    #[error("payload of chunk {0} lies outside the file")]
    PayloadOutOfRange(ChunkCoord),

    /// The same coordinate was added twice to one dimension.
    #[error("chunk {coord} already present in dimension {dimension:?}")]
    DuplicateChunk {
        /// Duplicate coordinate.
        coord: ChunkCoord,
        /// Dimension name.
        dimension: String,
    },

    /// A count does not fit its on-disk field.
    #[error("too many entries in {0}")]
    TooMany(&'static str),

    /// The reader has been closed.
    #[error("construction reader is closed")]
    Closed,
}

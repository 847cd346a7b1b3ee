//! Construction import pipeline.
//!
//! Turns a construction file into an [`ImportResult`]: every chunk of one
//! dimension, decoded and rebound onto a single shared block registry, plus
//! the file's bounding selection. Chunks that fail to decode are skipped;
//! progress is reported through a [`ProgressSink`] after every chunk.
//!
//! The container format itself is behind the [`FormatOpener`] and
//! [`FormatSource`] traits.

mod cancel;
mod error;
mod path;
mod pipeline;
mod progress;
mod result;
mod source;

pub use cancel::CancelToken;
pub use error::ImportError;
pub use path::{CONSTRUCTION_EXTENSION, CandidatePath, PathRejection, ValidPath};
pub use pipeline::{DimensionPolicy, ImportPipeline, ImportTask};
pub use progress::{ChannelProgress, NoProgress, ProgressEvent, ProgressRecorder, ProgressSink};
pub use result::{ChunkMap, ImportResult, PasteTarget, Structure};
pub use source::{BoxError, ChunkDecodeError, FormatOpener, FormatSource, SourceError, SourceOpenError};

//! The construction import pipeline.
//!
//! A run validates the path, opens a [`FormatSource`], enumerates every chunk
//! coordinate of one dimension up front, then decodes the chunks one by one
//! into a single shared [`BlockRegistry`]. A chunk that fails to decode is
//! skipped and the run carries on. Progress is reported once before the
//! first chunk (`0.0` plus a status line) and once after every coordinate,
//! so a run over `n` coordinates emits `n + 1` reports and ends at exactly
//! `1.0`. An empty container emits the initial report only.
//!
//! [`ImportPipeline::run`] drives everything synchronously. Hosts that want
//! to interleave their own work between chunks can use
//! [`ImportPipeline::start`] and step the returned [`ImportTask`] themselves.

use std::path::PathBuf;

use quarry_voxel::{BlockRegistry, ChunkCoord, Dimension, SelectionGroup};

use crate::cancel::CancelToken;
use crate::error::ImportError;
use crate::path::CandidatePath;
use crate::progress::ProgressSink;
use crate::result::{ChunkMap, ImportResult, Structure};
use crate::source::{FormatOpener, FormatSource, OpenSource};

/// Which dimension of a multi-dimension source gets imported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DimensionPolicy {
    /// The first dimension the source lists.
    #[default]
    First,
    /// The dimension with this name.
    Named(String),
}

impl DimensionPolicy {
    /// Picks a dimension out of `dimensions`.
    ///
    /// # Errors
    ///
    /// [`ImportError::NoDimensions`] if the list is empty,
    /// [`ImportError::DimensionNotFound`] if a named dimension is missing.
    pub fn select(&self, dimensions: &[Dimension]) -> Result<Dimension, ImportError> {
        let first = dimensions.first().ok_or(ImportError::NoDimensions)?;
        match self {
            Self::First => Ok(first.clone()),
            Self::Named(name) => dimensions
                .iter()
                .find(|d| d.as_str() == name)
                .cloned()
                .ok_or_else(|| ImportError::DimensionNotFound(name.clone())),
        }
    }
}

/// Imports construction files through a [`FormatOpener`].
#[derive(Debug)]
pub struct ImportPipeline<O> {
    opener: O,
    dimension_policy: DimensionPolicy,
    cancel: Option<CancelToken>,
}

impl<O: FormatOpener> ImportPipeline<O> {
    /// Creates a pipeline that opens files with `opener`.
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            dimension_policy: DimensionPolicy::default(),
            cancel: None,
        }
    }

    /// Sets which dimension to import.
    pub fn with_dimension_policy(mut self, policy: DimensionPolicy) -> Self {
        self.dimension_policy = policy;
        self
    }

    /// Lets `token` cancel [`run`](Self::run) between chunks.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The opener in use.
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Validates `path`, opens it, and enumerates its chunks.
    ///
    /// Nothing is reported to any sink here. The returned task owns the open
    /// source; dropping it closes the source.
    ///
    /// # Errors
    ///
    /// [`ImportError::InvalidPath`] and [`ImportError::OpenFailed`] before
    /// anything is open; [`ImportError::NoDimensions`],
    /// [`ImportError::DimensionNotFound`] or [`ImportError::Source`] after
    /// open, in which case the source has already been closed.
    pub fn start(&self, path: &str) -> Result<ImportTask<O::Source>, ImportError> {
        let path = CandidatePath::new(path).validate()?;
        let file_name = path.file_name();

        let mut source = OpenSource::new(self.opener.open(path.as_path())?);

        let dimensions = source.dimensions()?;
        let dimension = self.dimension_policy.select(&dimensions)?;
        let coordinates = source.all_chunk_coordinates(&dimension)?;
        let selection = source.selection()?;

        tracing::info!(
            path = %path.as_path().display(),
            dimension = %dimension,
            chunks = coordinates.len(),
            "importing construction"
        );

        Ok(ImportTask {
            source,
            status: format!("Importing {file_name}"),
            path: path.into_path_buf(),
            dimension,
            coordinates,
            next: 0,
            registry: BlockRegistry::new(),
            chunks: ChunkMap::default(),
            skipped: Vec::new(),
            selection,
        })
    }

    /// Runs a whole import, reporting to `sink`.
    ///
    /// # Errors
    ///
    /// Everything [`start`](Self::start) can fail with, plus
    /// [`ImportError::Cancelled`]. Chunk decode failures are not errors.
    pub fn run<S>(&self, path: &str, sink: &mut S) -> Result<ImportResult, ImportError>
    where
        S: ProgressSink + ?Sized,
    {
        let mut task = self.start(path)?;
        sink.report(0.0, Some(task.status()));

        while !task.is_done() {
            if self.is_cancelled() {
                tracing::info!(
                    completed = task.completed(),
                    total = task.total(),
                    "import cancelled"
                );
                return Err(ImportError::Cancelled);
            }
            if let Some(fraction) = task.step() {
                sink.report(fraction, None);
            }
        }

        Ok(task.finish())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// An import in progress, one chunk coordinate per [`step`](Self::step).
pub struct ImportTask<S: FormatSource> {
    source: OpenSource<S>,
    status: String,
    path: PathBuf,
    dimension: Dimension,
    coordinates: Vec<ChunkCoord>,
    next: usize,
    registry: BlockRegistry,
    chunks: ChunkMap,
    skipped: Vec<ChunkCoord>,
    selection: SelectionGroup,
}

impl<S: FormatSource> ImportTask<S> {
    /// Status line naming the file being imported.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Dimension being imported.
    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }

    /// Number of coordinates enumerated at start.
    pub fn total(&self) -> usize {
        self.coordinates.len()
    }

    /// Coordinates processed so far, decoded or skipped.
    pub fn completed(&self) -> usize {
        self.next
    }

    /// Returns `true` once every coordinate has been processed.
    pub fn is_done(&self) -> bool {
        self.next >= self.coordinates.len()
    }

    /// Processes the next coordinate and returns the new completion fraction,
    /// or `None` if every coordinate has already been processed.
    pub fn step(&mut self) -> Option<f64> {
        let coord = *self.coordinates.get(self.next)?;

        match self.source.load_chunk(coord, &self.dimension) {
            Ok(decoded) => {
                let chunk = decoded.rebind(&mut self.registry);
                tracing::debug!(%coord, sections = chunk.section_count(), "chunk imported");
                self.chunks.insert(coord, chunk);
            }
            Err(err) => {
                tracing::warn!(%coord, error = %err, "skipping chunk that failed to decode");
                self.skipped.push(coord);
            }
        }

        self.next += 1;
        Some(self.next as f64 / self.coordinates.len() as f64)
    }

    /// Closes the source and assembles the result.
    ///
    /// Coordinates not stepped yet are processed first, without reports.
    pub fn finish(mut self) -> ImportResult {
        while self.step().is_some() {}

        let Self {
            source,
            path,
            coordinates,
            registry,
            chunks,
            skipped,
            selection,
            ..
        } = self;
        drop(source);

        tracing::info!(
            path = %path.display(),
            imported = chunks.len(),
            skipped = skipped.len(),
            block_types = registry.len(),
            "construction import finished"
        );

        ImportResult::new(
            Structure {
                chunks,
                registry,
                selection,
            },
            skipped,
            coordinates.len(),
            path,
        )
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

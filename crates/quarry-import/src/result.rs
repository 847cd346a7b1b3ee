//! The assembled output of an import run.

use std::path::{Path, PathBuf};

use quarry_voxel::{BlockRegistry, Chunk, ChunkCoord, SelectionGroup};
use rustc_hash::FxHashMap;

/// Decoded chunks keyed by coordinate.
pub type ChunkMap = FxHashMap<ChunkCoord, Chunk>;

/// Chunks, their shared registry, and the selection, ready to be pasted.
#[derive(Debug)]
pub struct Structure {
    /// Every successfully decoded chunk, bound to `registry`.
    pub chunks: ChunkMap,
    /// Registry all chunk ids refer to.
    pub registry: BlockRegistry,
    /// Bounding selection from the source file.
    pub selection: SelectionGroup,
}

/// Merges imported structures into a live scene.
pub trait PasteTarget {
    /// Error raised when the merge fails.
    type Error;

    /// Takes ownership of `structure` and merges it.
    fn paste(&mut self, structure: Structure) -> Result<(), Self::Error>;
}

/// Output of a successful import run.
///
/// Holds the pasteable [`Structure`] plus diagnostics. It is meant to be
/// consumed once, via [`paste_into`](Self::paste_into) or
/// [`into_structure`](Self::into_structure).
#[derive(Debug)]
pub struct ImportResult {
    structure: Structure,
    skipped: Vec<ChunkCoord>,
    enumerated: usize,
    source_path: PathBuf,
}

impl ImportResult {
    pub(crate) fn new(
        structure: Structure,
        skipped: Vec<ChunkCoord>,
        enumerated: usize,
        source_path: PathBuf,
    ) -> Self {
        Self {
            structure,
            skipped,
            enumerated,
            source_path,
        }
    }

    /// Decoded chunks.
    pub fn chunks(&self) -> &ChunkMap {
        &self.structure.chunks
    }

    /// The chunk at `coord`, if it decoded.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.structure.chunks.get(&coord)
    }

    /// Shared registry of every block type in the chunks.
    pub fn registry(&self) -> &BlockRegistry {
        &self.structure.registry
    }

    /// Bounding selection from the source.
    pub fn selection(&self) -> &SelectionGroup {
        &self.structure.selection
    }

    /// Coordinates whose chunk failed to decode, in enumeration order.
    pub fn skipped(&self) -> &[ChunkCoord] {
        &self.skipped
    }

    /// Number of coordinates the source enumerated.
    pub fn enumerated(&self) -> usize {
        self.enumerated
    }

    /// File the result was imported from.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Releases the pasteable structure.
    pub fn into_structure(self) -> Structure {
        self.structure
    }

    /// Hands the structure to `target`.
    pub fn paste_into<T: PasteTarget + ?Sized>(self, target: &mut T) -> Result<(), T::Error> {
        tracing::debug!(
            chunks = self.structure.chunks.len(),
            blocks = self.structure.registry.len(),
            "pasting imported structure"
        );
        target.paste(self.structure)
    }
}

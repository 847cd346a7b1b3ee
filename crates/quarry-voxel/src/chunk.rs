//! Chunk columns and their binding to a [`BlockRegistry`].
//!
//! A [`Chunk`] is a column of [`Section`]s keyed by section Y. Its section
//! palettes hold [`BlockId`]s, which only mean something relative to the
//! registry the chunk is bound to. The binding is the registry's
//! [`RegistryToken`]; the chunk never owns the registry itself.
//!
//! Format readers hand out [`DecodedChunk`]s, which pair a chunk with the
//! palette it was decoded against. [`DecodedChunk::rebind`] moves the chunk
//! into a shared registry.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::coords::ChunkCoord;
use crate::registry::{BlockDescriptor, BlockId, BlockRegistry, RegistryToken};
use crate::section::{SECTION_SIZE, Section};

/// A chunk whose ids do not line up with the registry it was paired with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    /// The chunk is bound to some other registry.
    #[error("chunk {0} is bound to a different registry")]
    RegistryMismatch(ChunkCoord),
    /// A section palette references an id the registry never produced.
    #[error("chunk {coord} references unknown block id {id}")]
    UnknownBlock {
        /// The chunk.
        coord: ChunkCoord,
        /// The dangling id.
        id: u32,
    },
}

/// A column of palette-compressed sections at one coordinate.
///
/// Block access takes local `x`/`z` in `0..16` and an absolute `y`. Reads
/// outside the column or from a missing section return `None`.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    sections: BTreeMap<i32, Section>,
    binding: RegistryToken,
}

impl Chunk {
    /// Creates an empty chunk bound to `registry`.
    pub fn new(coord: ChunkCoord, registry: &BlockRegistry) -> Self {
        Self {
            coord,
            sections: BTreeMap::new(),
            binding: registry.token(),
        }
    }

    /// Position of this chunk.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Token of the registry the block ids refer to.
    pub fn binding(&self) -> RegistryToken {
        self.binding
    }

    /// Returns `true` if the chunk's ids refer to `registry`.
    pub fn is_bound_to(&self, registry: &BlockRegistry) -> bool {
        self.binding == registry.token()
    }

    /// Inserts or replaces the section at section-Y `cy`.
    pub fn insert_section(&mut self, cy: i32, section: Section) -> Option<Section> {
        self.sections.insert(cy, section)
    }

    /// The section at section-Y `cy`.
    pub fn section(&self, cy: i32) -> Option<&Section> {
        self.sections.get(&cy)
    }

    /// Sections bottom to top.
    pub fn sections(&self) -> impl Iterator<Item = (i32, &Section)> {
        self.sections.iter().map(|(&cy, s)| (cy, s))
    }

    /// Number of stored sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Returns the block id at local `(x, z)` and absolute `y`.
    pub fn block_id(&self, x: u8, y: i32, z: u8) -> Option<BlockId> {
        if !Self::in_column(x, z) {
            tracing::warn!("Chunk::block_id out of bounds: ({}, {}, {})", x, y, z);
            return None;
        }
        let (cy, ly) = Self::split_y(y);
        self.sections
            .get(&cy)
            .map(|s| s.get(usize::from(x), ly, usize::from(z)))
    }

    /// Resolves the block at `(x, y, z)` through `registry`.
    ///
    /// Returns `None` with a warning if `registry` is not the one this chunk
    /// is bound to.
    pub fn block<'r>(&self, x: u8, y: i32, z: u8, registry: &'r BlockRegistry) -> Option<&'r BlockDescriptor> {
        if !self.is_bound_to(registry) {
            tracing::warn!(coord = %self.coord, "block lookup through a registry the chunk is not bound to");
            return None;
        }
        registry.get(self.block_id(x, y, z)?)
    }

    /// Sets the block at `(x, y, z)`.
    ///
    /// Returns `false` (and changes nothing) if the position is outside the
    /// column or its section does not exist yet.
    pub fn set_block_id(&mut self, x: u8, y: i32, z: u8, id: BlockId) -> bool {
        if !Self::in_column(x, z) {
            tracing::warn!("Chunk::set_block_id out of bounds: ({}, {}, {})", x, y, z);
            return false;
        }
        let (cy, ly) = Self::split_y(y);
        match self.sections.get_mut(&cy) {
            Some(section) => {
                section.set(usize::from(x), ly, usize::from(z), id);
                true
            }
            None => false,
        }
    }

    /// Distinct block ids referenced by any section palette.
    pub fn block_ids(&self) -> BTreeSet<BlockId> {
        self.sections
            .values()
            .flat_map(|s| s.palette().iter().copied())
            .collect()
    }

    /// Checks that every referenced id resolves in `registry`.
    ///
    /// # Errors
    ///
    /// [`ChunkError::RegistryMismatch`] if the chunk is bound elsewhere, or
    /// [`ChunkError::UnknownBlock`] for the first dangling id.
    pub fn validate_against(&self, registry: &BlockRegistry) -> Result<(), ChunkError> {
        if !self.is_bound_to(registry) {
            return Err(ChunkError::RegistryMismatch(self.coord));
        }
        match self.block_ids().into_iter().find(|&id| registry.get(id).is_none()) {
            Some(id) => Err(ChunkError::UnknownBlock {
                coord: self.coord,
                id: id.0,
            }),
            None => Ok(()),
        }
    }

    /// Rewrites every section palette through `map` and binds the chunk to
    /// `target`.
    ///
    /// `map` must send each id of the current registry to the id of the same
    /// descriptor in `target`. Sections whose palettes end up with repeated
    /// ids are compacted.
    pub fn remap_into(&mut self, target: &BlockRegistry, mut map: impl FnMut(BlockId) -> BlockId) {
        for section in self.sections.values_mut() {
            section.remap(&mut map);
            if has_duplicates(section.palette()) {
                section.compact();
            }
        }
        self.binding = target.token();
    }

    fn in_column(x: u8, z: u8) -> bool {
        usize::from(x) < SECTION_SIZE && usize::from(z) < SECTION_SIZE
    }

    fn split_y(y: i32) -> (i32, usize) {
        let size = SECTION_SIZE as i32;
        (y.div_euclid(size), y.rem_euclid(size) as usize)
    }
}

/// A chunk as produced by a format reader, still bound to the chunk-local
/// palette it was decoded with.
#[derive(Debug)]
pub struct DecodedChunk {
    chunk: Chunk,
    palette: BlockRegistry,
}

impl DecodedChunk {
    /// Pairs a chunk with its local palette.
    ///
    /// # Errors
    ///
    /// Fails if the chunk is not bound to `palette` or references ids
    /// missing from it.
    pub fn new(chunk: Chunk, palette: BlockRegistry) -> Result<Self, ChunkError> {
        chunk.validate_against(&palette)?;
        Ok(Self { chunk, palette })
    }

    /// Position of the chunk.
    pub fn coord(&self) -> ChunkCoord {
        self.chunk.coord
    }

    /// The chunk-local palette.
    pub fn palette(&self) -> &BlockRegistry {
        &self.palette
    }

    /// The chunk, with ids relative to [`palette`](Self::palette).
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Moves the chunk into `shared`.
    ///
    /// Every descriptor the chunk references is interned into `shared`, the
    /// section palettes are rewritten to the shared ids, and the returned
    /// chunk is bound to `shared`. Descriptors the local palette holds but no
    /// section uses are not interned.
    pub fn rebind(self, shared: &mut BlockRegistry) -> Chunk {
        let Self { mut chunk, palette } = self;

        let mut remap: FxHashMap<BlockId, BlockId> = FxHashMap::default();
        for local in chunk.block_ids() {
            if let Some(block) = palette.get(local) {
                remap.insert(local, shared.intern(block));
            }
        }

        chunk.remap_into(shared, |id| remap.get(&id).copied().unwrap_or(id));
        chunk
    }
}

fn has_duplicates(palette: &[BlockId]) -> bool {
    let mut seen = BTreeSet::new();
    !palette.iter().all(|id| seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(name: &str) -> BlockDescriptor {
        BlockDescriptor::new("minecraft", name)
    }

    /// A chunk with one section at y 0..16: stone floor, one `top` block.
    fn decoded(coord: ChunkCoord, floor: &str, top: &str) -> DecodedChunk {
        let mut palette = BlockRegistry::new();
        let air = palette.intern(&block("air"));
        let floor = palette.intern(&block(floor));
        let top = palette.intern(&block(top));
        let mut section = Section::new(air);
        for x in 0..16 {
            for z in 0..16 {
                section.set(x, 0, z, floor);
            }
        }
        section.set(8, 1, 8, top);
        let mut chunk = Chunk::new(coord, &palette);
        chunk.insert_section(0, section);
        DecodedChunk::new(chunk, palette).unwrap()
    }

    #[test]
    fn test_block_reads_through_bound_registry() {
        let d = decoded(ChunkCoord::new(0, 0), "stone", "torch");
        let chunk = d.chunk();
        assert_eq!(chunk.block(8, 1, 8, d.palette()), Some(&block("torch")));
        assert_eq!(chunk.block(0, 0, 0, d.palette()), Some(&block("stone")));
        assert_eq!(chunk.block(0, 5, 0, d.palette()), Some(&block("air")));
        assert_eq!(chunk.block(0, 16, 0, d.palette()), None, "no section above");
        assert_eq!(chunk.block(16, 0, 0, d.palette()), None);
    }

    #[test]
    fn test_block_through_foreign_registry_is_none() {
        let d = decoded(ChunkCoord::new(0, 0), "stone", "torch");
        let other = BlockRegistry::new();
        assert_eq!(d.chunk().block(0, 0, 0, &other), None);
    }

    #[test]
    fn test_rebind_shares_ids_across_chunks() {
        let mut shared = BlockRegistry::new();
        let a = decoded(ChunkCoord::new(0, 0), "stone", "torch").rebind(&mut shared);
        let b = decoded(ChunkCoord::new(1, 0), "dirt", "torch").rebind(&mut shared);

        assert!(a.is_bound_to(&shared));
        assert!(b.is_bound_to(&shared));
        assert_eq!(a.block_id(8, 1, 8), b.block_id(8, 1, 8));
        assert_eq!(a.block_id(0, 5, 0), b.block_id(0, 5, 0));
        assert_ne!(a.block_id(0, 0, 0), b.block_id(0, 0, 0));
        // air, stone, torch, dirt
        assert_eq!(shared.len(), 4);
        assert_eq!(b.block(0, 0, 0, &shared), Some(&block("dirt")));
    }

    #[test]
    fn test_rebind_skips_unused_palette_entries() {
        let mut palette = BlockRegistry::new();
        let used = palette.intern(&block("stone"));
        palette.intern(&block("unused"));
        let mut chunk = Chunk::new(ChunkCoord::new(2, 2), &palette);
        chunk.insert_section(-1, Section::new(used));
        let decoded = DecodedChunk::new(chunk, palette).unwrap();

        let mut shared = BlockRegistry::new();
        let chunk = decoded.rebind(&mut shared);
        assert_eq!(shared.len(), 1);
        assert_eq!(chunk.block(3, -1, 3, &shared), Some(&block("stone")));
    }

    #[test]
    fn test_rebind_merges_duplicate_descriptors() {
        let mut palette = BlockRegistry::new();
        let stone = palette.intern(&block("stone"));
        let dirt = palette.intern(&block("dirt"));
        // Files may repeat a palette entry within one section.
        let mut storage = crate::BitPackedArray::new(2, crate::SECTION_VOLUME);
        storage.set(0, 2);
        storage.set(1, 1);
        let section = Section::from_raw_parts(vec![stone, dirt, stone], storage).unwrap();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), &palette);
        chunk.insert_section(0, section);
        let decoded = DecodedChunk::new(chunk, palette).unwrap();

        let mut shared = BlockRegistry::new();
        let rebound = decoded.rebind(&mut shared);
        let section = rebound.section(0).unwrap();
        assert_eq!(section.palette().len(), 2);
        assert_eq!(rebound.block(0, 0, 0, &shared), Some(&block("stone")));
        assert_eq!(rebound.block(1, 0, 0, &shared), Some(&block("dirt")));
        assert_eq!(rebound.block(2, 0, 0, &shared), Some(&block("stone")));
    }

    #[test]
    fn test_decoded_chunk_rejects_dangling_ids() {
        let palette = BlockRegistry::new();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), &palette);
        chunk.insert_section(0, Section::new(BlockId(3)));
        assert_eq!(
            DecodedChunk::new(chunk, palette).unwrap_err(),
            ChunkError::UnknownBlock {
                coord: ChunkCoord::new(0, 0),
                id: 3
            }
        );
    }

    #[test]
    fn test_decoded_chunk_rejects_foreign_binding() {
        let palette = BlockRegistry::new();
        let chunk = Chunk::new(ChunkCoord::new(4, 4), &BlockRegistry::new());
        assert_eq!(
            DecodedChunk::new(chunk, palette).unwrap_err(),
            ChunkError::RegistryMismatch(ChunkCoord::new(4, 4))
        );
    }

    #[test]
    fn test_set_block_id_needs_existing_section() {
        let palette = BlockRegistry::new();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), &palette);
        assert!(!chunk.set_block_id(0, 0, 0, BlockId(0)));
        chunk.insert_section(0, Section::new(BlockId(0)));
        assert!(chunk.set_block_id(3, 4, 5, BlockId(1)));
        assert_eq!(chunk.block_id(3, 4, 5), Some(BlockId(1)));
        assert!(!chunk.set_block_id(16, 0, 0, BlockId(1)));
    }
}

//! The in-memory editing session imports are pasted into.

use quarry_import::{ChunkMap, PasteTarget, Structure};
use quarry_voxel::{BlockId, BlockRegistry, Chunk, ChunkCoord, ChunkError, SelectionGroup};
use rustc_hash::FxHashMap;

/// A world being edited: its own block registry, the chunks bound to it, and
/// the selections of everything pasted so far.
#[derive(Debug, Default)]
pub struct EditSession {
    registry: BlockRegistry,
    chunks: ChunkMap,
    selections: Vec<SelectionGroup>,
}

impl EditSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The session's registry.
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Every chunk in the session.
    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    /// The chunk at `coord`.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Selections of the pasted structures, oldest first.
    pub fn selections(&self) -> &[SelectionGroup] {
        &self.selections
    }
}

impl PasteTarget for EditSession {
    type Error = ChunkError;

    /// Moves every chunk of `structure` into the session registry. A pasted
    /// chunk replaces whatever was at its coordinate.
    ///
    /// Nothing is changed if any chunk is not bound to the structure's
    /// registry.
    fn paste(&mut self, structure: Structure) -> Result<(), ChunkError> {
        let Structure {
            chunks,
            registry,
            selection,
        } = structure;

        for chunk in chunks.values() {
            chunk.validate_against(&registry)?;
        }

        let remap: FxHashMap<BlockId, BlockId> = registry
            .iter()
            .map(|(id, block)| (id, self.registry.intern(block)))
            .collect();

        let pasted = chunks.len();
        for (coord, mut chunk) in chunks {
            chunk.remap_into(&self.registry, |id| remap.get(&id).copied().unwrap_or(id));
            self.chunks.insert(coord, chunk);
        }
        self.selections.push(selection);

        tracing::info!(
            pasted,
            total_chunks = self.chunks.len(),
            block_types = self.registry.len(),
            "structure pasted into session"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quarry_voxel::{BlockDescriptor, Section, SelectionBox};

    use super::*;

    fn block(name: &str) -> BlockDescriptor {
        BlockDescriptor::new("minecraft", name)
    }

    fn structure(coord: ChunkCoord, names: &[&str]) -> Structure {
        let mut registry = BlockRegistry::new();
        let ids: Vec<_> = names.iter().map(|n| registry.intern(&block(n))).collect();
        let mut chunk = Chunk::new(coord, &registry);
        chunk.insert_section(0, Section::new(ids[0]));
        for (i, id) in ids.iter().enumerate().skip(1) {
            chunk.set_block_id(i as u8, 0, 0, *id);
        }
        let mut chunks = ChunkMap::default();
        chunks.insert(coord, chunk);
        Structure {
            chunks,
            registry,
            selection: SelectionGroup::new(vec![SelectionBox::new([0, 0, 0], [16, 16, 16])]),
        }
    }

    #[test]
    fn test_paste_rebinds_into_session_registry() {
        let mut session = EditSession::new();
        session.paste(structure(ChunkCoord::new(0, 0), &["stone", "dirt"])).unwrap();
        session.paste(structure(ChunkCoord::new(1, 0), &["dirt", "stone", "glass"])).unwrap();

        let registry = session.registry();
        assert_eq!(registry.len(), 3);
        let a = session.chunk(ChunkCoord::new(0, 0)).unwrap();
        let b = session.chunk(ChunkCoord::new(1, 0)).unwrap();
        assert!(a.is_bound_to(registry));
        assert!(b.is_bound_to(registry));
        assert_eq!(a.block(0, 0, 0, registry), Some(&block("stone")));
        assert_eq!(b.block(0, 0, 0, registry), Some(&block("dirt")));
        assert_eq!(b.block(2, 0, 0, registry), Some(&block("glass")));
        assert_eq!(a.block_id(1, 0, 0), b.block_id(0, 0, 0));
        assert_eq!(session.selections().len(), 2);
    }

    #[test]
    fn test_paste_replaces_chunk_at_same_coord() {
        let mut session = EditSession::new();
        session.paste(structure(ChunkCoord::new(0, 0), &["stone"])).unwrap();
        session.paste(structure(ChunkCoord::new(0, 0), &["sand"])).unwrap();

        let chunk = session.chunk(ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(session.chunks().len(), 1);
        assert_eq!(chunk.block(5, 5, 5, session.registry()), Some(&block("sand")));
    }

    #[test]
    fn test_paste_rejects_unbound_chunk() {
        let mut bad = structure(ChunkCoord::new(0, 0), &["stone"]);
        bad.registry = BlockRegistry::new();
        let mut session = EditSession::new();

        let err = session.paste(bad).unwrap_err();
        assert_eq!(err, ChunkError::RegistryMismatch(ChunkCoord::new(0, 0)));
        assert!(session.chunks().is_empty());
        assert!(session.registry().is_empty());
    }
}

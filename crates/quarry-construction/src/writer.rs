//! Builds construction containers.

use std::path::Path;

use quarry_voxel::{BlockRegistry, Chunk, ChunkCoord, Dimension, SelectionGroup};
use rustc_hash::FxHashSet;

use crate::codec::encode_chunk;
use crate::error::ConstructionError;
use crate::header::{ChunkEntry, Header};

struct PendingChunk {
    dimension: u16,
    coord: ChunkCoord,
    payload: Vec<u8>,
}

/// Collects dimensions, a selection and encoded chunks, then writes them
/// out as one container.
#[derive(Default)]
pub struct ConstructionWriter {
    dimensions: Vec<Dimension>,
    selection: SelectionGroup,
    chunks: Vec<PendingChunk>,
    seen: FxHashSet<(u16, ChunkCoord)>,
}

impl ConstructionWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists `dimension` in the header if it is not there yet and returns
    /// its index.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::TooMany`] past 65535 dimensions.
    pub fn add_dimension(&mut self, dimension: Dimension) -> Result<u16, ConstructionError> {
        if let Some(i) = self.dimensions.iter().position(|d| *d == dimension) {
            return Ok(i as u16);
        }
        let index = u16::try_from(self.dimensions.len()).map_err(|_| ConstructionError::TooMany("dimensions"))?;
        self.dimensions.push(dimension);
        Ok(index)
    }

    /// Replaces the stored selection.
    pub fn set_selection(&mut self, selection: SelectionGroup) {
        self.selection = selection;
    }

    /// Encodes `chunk` into `dimension`, adding the dimension if needed.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::DuplicateChunk`] if the coordinate is already
    /// present in that dimension, or any encode error.
    pub fn add_chunk(
        &mut self,
        dimension: &Dimension,
        chunk: &Chunk,
        registry: &BlockRegistry,
    ) -> Result<(), ConstructionError> {
        let payload = encode_chunk(chunk, registry)?;
        self.add_raw_chunk(dimension, chunk.coord(), payload)
    }

    /// Stores `payload` verbatim as the chunk at `coord`.
    ///
    /// No validation happens, so this can produce chunks that fail to
    /// decode.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::DuplicateChunk`], or
    /// [`ConstructionError::TooMany`] if the dimension cannot be added.
    pub fn add_raw_chunk(
        &mut self,
        dimension: &Dimension,
        coord: ChunkCoord,
        payload: Vec<u8>,
    ) -> Result<(), ConstructionError> {
        let dim = self.add_dimension(dimension.clone())?;
        if !self.seen.insert((dim, coord)) {
            return Err(ConstructionError::DuplicateChunk {
                coord,
                dimension: dimension.to_string(),
            });
        }
        self.chunks.push(PendingChunk {
            dimension: dim,
            coord,
            payload,
        });
        Ok(())
    }

    /// Number of chunks added so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Serializes the whole container.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::TooMany`] if a count or payload overflows its
    /// field.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        // The header size depends only on the entry count, so offsets are
        // filled in after laying out placeholder entries.
        let mut header = Header {
            dimensions: self.dimensions.clone(),
            selection: self.selection.clone(),
            entries: self
                .chunks
                .iter()
                .map(|c| ChunkEntry {
                    dimension: c.dimension,
                    coord: c.coord,
                    offset: 0,
                    len: 0,
                })
                .collect(),
        };

        let mut offset = header.encoded_len() as u64;
        for (entry, chunk) in header.entries.iter_mut().zip(&self.chunks) {
            entry.offset = offset;
            entry.len = u32::try_from(chunk.payload.len()).map_err(|_| ConstructionError::TooMany("chunk payload"))?;
            offset += u64::from(entry.len);
        }

        let mut buf = Vec::with_capacity(offset as usize);
        header.write(&mut buf)?;
        for chunk in &self.chunks {
            buf.extend_from_slice(&chunk.payload);
        }
        Ok(buf)
    }

    /// Serializes the container and writes it to `path`.
    ///
    /// # Errors
    ///
    /// Everything [`to_bytes`](Self::to_bytes) can fail with, plus I/O
    /// errors.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ConstructionError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            chunks = self.chunks.len(),
            bytes = bytes.len(),
            "wrote construction file"
        );
        Ok(())
    }
}

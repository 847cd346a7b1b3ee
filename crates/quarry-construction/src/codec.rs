//! Little-endian primitives and the chunk payload codec.
//!
//! ## Chunk payload layout
//!
//! | Size | Field |
//! |------|-------|
//! | 2 | Chunk palette length `P` (`u16`) |
//! | P × (2 + n) | Block strings, each a `u16` byte length then UTF-8 |
//! | 2 | Section count `S` (`u16`) |
//!
//! followed by `S` sections:
//!
//! | Size | Field |
//! |------|-------|
//! | 4 | Section Y (`i32`) |
//! | 2 | Section palette length `L` (`u16`) |
//! | L × 4 | Indices into the chunk palette (`u32`) |
//! | 1 | Bit width (`u8`: 0, 2, 4, 8, or 16) |
//! | M | Bit-packed indices into the section palette |
//!
//! Where M = `ceil(4096 × bit_width / 8)` bytes (0 when bit_width is 0).

use std::io::{self, Read};

use quarry_voxel::{
    BitPackedArray, BlockDescriptor, BlockId, BlockRegistry, Chunk, ChunkCoord, DecodedChunk,
    SECTION_VOLUME, Section, bit_packed::is_valid_bit_width,
};
use rustc_hash::FxHashMap;

use crate::error::ConstructionError;

/// Cap on speculative `Vec` preallocation driven by on-disk counts.
const MAX_PREALLOC: usize = 1024;

/// Reads little-endian fields, mapping a short read to
/// [`ConstructionError::Truncated`].
pub(crate) struct Decoder<R> {
    inner: R,
}

impl<R: Read> Decoder<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }

    fn fill<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], ConstructionError> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| truncated(e, what))?;
        Ok(buf)
    }

    pub(crate) fn u8(&mut self, what: &'static str) -> Result<u8, ConstructionError> {
        Ok(self.fill::<1>(what)?[0])
    }

    pub(crate) fn u16(&mut self, what: &'static str) -> Result<u16, ConstructionError> {
        Ok(u16::from_le_bytes(self.fill(what)?))
    }

    pub(crate) fn u32(&mut self, what: &'static str) -> Result<u32, ConstructionError> {
        Ok(u32::from_le_bytes(self.fill(what)?))
    }

    pub(crate) fn i32(&mut self, what: &'static str) -> Result<i32, ConstructionError> {
        Ok(i32::from_le_bytes(self.fill(what)?))
    }

    pub(crate) fn u64(&mut self, what: &'static str) -> Result<u64, ConstructionError> {
        Ok(u64::from_le_bytes(self.fill(what)?))
    }

    pub(crate) fn bytes(&mut self, len: usize, what: &'static str) -> Result<Vec<u8>, ConstructionError> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf).map_err(|e| truncated(e, what))?;
        Ok(buf)
    }

    /// A `u16` length followed by that many UTF-8 bytes.
    pub(crate) fn string(&mut self, what: &'static str) -> Result<String, ConstructionError> {
        let len = usize::from(self.u16(what)?);
        let raw = self.bytes(len, what)?;
        String::from_utf8(raw).map_err(|_| ConstructionError::InvalidUtf8(what))
    }
}

fn truncated(err: io::Error, what: &'static str) -> ConstructionError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ConstructionError::Truncated(what)
    } else {
        ConstructionError::Io(err)
    }
}

pub(crate) fn prealloc<T>(count: usize) -> Vec<T> {
    Vec::with_capacity(count.min(MAX_PREALLOC))
}

pub(crate) fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_string(buf: &mut Vec<u8>, value: &str, what: &'static str) -> Result<(), ConstructionError> {
    let len = u16::try_from(value.len()).map_err(|_| ConstructionError::TooMany(what))?;
    put_u16(buf, len);
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Returns the number of bytes needed for a section's bit-packed indices.
pub(crate) fn index_data_len(bit_width: u8) -> usize {
    if bit_width == 0 {
        return 0;
    }
    (SECTION_VOLUME * usize::from(bit_width)).div_ceil(8)
}

/// Encodes `chunk`, whose ids resolve in `registry`, as a payload.
///
/// The chunk palette holds only the descriptors some section uses.
///
/// # Errors
///
/// [`ConstructionError::Chunk`] if the chunk is not bound to `registry`,
/// [`ConstructionError::TooMany`] if a count overflows its field.
pub(crate) fn encode_chunk(chunk: &Chunk, registry: &BlockRegistry) -> Result<Vec<u8>, ConstructionError> {
    chunk.validate_against(registry)?;

    let ids = chunk.block_ids();
    let palette_len = u16::try_from(ids.len()).map_err(|_| ConstructionError::TooMany("chunk palette"))?;
    let mut file_index: FxHashMap<BlockId, u32> = FxHashMap::default();

    let mut buf = Vec::new();
    put_u16(&mut buf, palette_len);
    for (i, id) in ids.iter().enumerate() {
        // validate_against guarantees every id resolves.
        let Some(block) = registry.get(*id) else {
            continue;
        };
        put_string(&mut buf, &block.to_string(), "block string")?;
        file_index.insert(*id, i as u32);
    }

    let section_count =
        u16::try_from(chunk.section_count()).map_err(|_| ConstructionError::TooMany("section count"))?;
    put_u16(&mut buf, section_count);
    for (cy, section) in chunk.sections() {
        put_i32(&mut buf, cy);
        let palette = section.palette();
        let len = u16::try_from(palette.len()).map_err(|_| ConstructionError::TooMany("section palette"))?;
        put_u16(&mut buf, len);
        for id in palette {
            put_u32(&mut buf, file_index.get(id).copied().unwrap_or_default());
        }

        let bit_width = section.bit_width();
        buf.push(bit_width);
        let start = buf.len();
        for word in section.storage().raw_words() {
            put_u64(&mut buf, *word);
        }
        buf.truncate(start + index_data_len(bit_width));
    }

    Ok(buf)
}

/// Decodes a payload into a chunk bound to a fresh chunk-local palette.
///
/// # Errors
///
/// Any structural problem in the payload: truncation, a bad block string,
/// an out-of-range palette index, an invalid bit width, inconsistent section
/// data or a repeated section Y.
pub(crate) fn decode_chunk(data: &[u8], coord: ChunkCoord) -> Result<DecodedChunk, ConstructionError> {
    let mut d = Decoder::new(data);

    let palette_len = usize::from(d.u16("chunk palette length")?);
    let mut palette = BlockRegistry::new();
    let mut local_ids: Vec<BlockId> = prealloc(palette_len);
    for _ in 0..palette_len {
        let text = d.string("block string")?;
        let block: BlockDescriptor = match text.parse() {
            Ok(block) => block,
            Err(source) => return Err(ConstructionError::InvalidBlock { text, source }),
        };
        local_ids.push(palette.intern(&block));
    }

    let mut chunk = Chunk::new(coord, &palette);
    let section_count = d.u16("section count")?;
    for _ in 0..section_count {
        let cy = d.i32("section y")?;

        let len = usize::from(d.u16("section palette length")?);
        let mut section_palette = prealloc(len);
        for _ in 0..len {
            let index = d.u32("section palette entry")?;
            let id = local_ids
                .get(index as usize)
                .copied()
                .ok_or(ConstructionError::InvalidPaletteIndex {
                    index,
                    len: local_ids.len(),
                })?;
            section_palette.push(id);
        }

        let bit_width = d.u8("bit width")?;
        if !is_valid_bit_width(bit_width) {
            return Err(ConstructionError::InvalidBitWidth(bit_width));
        }
        let raw = d.bytes(index_data_len(bit_width), "section indices")?;
        let words = raw
            .chunks(8)
            .map(|part| {
                let mut word = [0u8; 8];
                word[..part.len()].copy_from_slice(part);
                u64::from_le_bytes(word)
            })
            .collect();
        let storage = BitPackedArray::from_raw(bit_width, SECTION_VOLUME, words)
            .ok_or(ConstructionError::InvalidBitWidth(bit_width))?;

        let section = Section::from_raw_parts(section_palette, storage)?;
        if chunk.insert_section(cy, section).is_some() {
            return Err(ConstructionError::DuplicateSection(cy));
        }
    }

    Ok(DecodedChunk::new(chunk, palette)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use quarry_voxel::SectionError;

    use super::*;

    fn block(name: &str) -> BlockDescriptor {
        BlockDescriptor::new("minecraft", name)
    }

    fn sample_chunk(registry: &mut BlockRegistry) -> Chunk {
        let stone = registry.intern(&block("stone"));
        let log = registry.intern(&block("oak_log").with_property("axis", "y"));
        let air = registry.intern(&block("air"));
        let mut chunk = Chunk::new(ChunkCoord::new(3, -2), registry);
        chunk.insert_section(0, Section::new(stone));
        chunk.insert_section(-1, Section::new(air));
        chunk.set_block_id(4, 5, 6, log);
        chunk.set_block_id(15, -1, 15, stone);
        chunk
    }

    #[test]
    fn test_decode_restores_blocks_and_properties() {
        let mut registry = BlockRegistry::new();
        let chunk = sample_chunk(&mut registry);
        let payload = encode_chunk(&chunk, &registry).unwrap();

        let decoded = decode_chunk(&payload, chunk.coord()).unwrap();
        let palette = decoded.palette();
        let restored = decoded.chunk();

        assert_eq!(restored.section_count(), 2);
        let at = |x, y, z| restored.block(x, y, z, palette).map(ToString::to_string);
        assert_eq!(at(4, 5, 6).as_deref(), Some("minecraft:oak_log[axis=y]"));
        assert_eq!(at(0, 0, 0).as_deref(), Some("minecraft:stone"));
        assert_eq!(at(15, -1, 15).as_deref(), Some("minecraft:stone"));
        assert_eq!(at(0, -16, 0).as_deref(), Some("minecraft:air"));
    }

    #[test]
    fn test_unused_registry_entries_are_not_written() {
        let mut registry = BlockRegistry::new();
        registry.intern(&block("diamond_block"));
        let chunk = sample_chunk(&mut registry);
        let payload = encode_chunk(&chunk, &registry).unwrap();

        let decoded = decode_chunk(&payload, chunk.coord()).unwrap();
        assert_eq!(decoded.palette().len(), 3);
        assert!(decoded.palette().lookup(&block("diamond_block")).is_none());
    }

    #[test]
    fn test_uniform_section_stores_no_indices() {
        let mut registry = BlockRegistry::new();
        let stone = registry.intern(&block("stone"));
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), &registry);
        chunk.insert_section(2, Section::new(stone));
        let payload = encode_chunk(&chunk, &registry).unwrap();

        // palette(2) + "minecraft:stone"(2 + 15) + sections(2) + y(4) + len(2) + idx(4) + bits(1)
        assert_eq!(payload.len(), 2 + 17 + 2 + 4 + 2 + 4 + 1);
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let mut registry = BlockRegistry::new();
        let chunk = sample_chunk(&mut registry);
        let payload = encode_chunk(&chunk, &registry).unwrap();

        let err = decode_chunk(&payload[..payload.len() - 10], chunk.coord()).unwrap_err();
        assert!(matches!(err, ConstructionError::Truncated("section indices")));
        let err = decode_chunk(&[], chunk.coord()).unwrap_err();
        assert!(matches!(err, ConstructionError::Truncated(_)));
    }

    #[test]
    fn test_bad_block_string_is_rejected() {
        let mut payload = Vec::new();
        put_u16(&mut payload, 1);
        put_string(&mut payload, "minecraft:stone[axis", "block").unwrap();
        put_u16(&mut payload, 0);

        let err = decode_chunk(&payload, ChunkCoord::new(0, 0)).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidBlock { .. }));
    }

    #[test]
    fn test_palette_index_out_of_range_is_rejected() {
        let mut payload = Vec::new();
        put_u16(&mut payload, 1);
        put_string(&mut payload, "minecraft:stone", "block").unwrap();
        put_u16(&mut payload, 1);
        put_i32(&mut payload, 0);
        put_u16(&mut payload, 1);
        put_u32(&mut payload, 7);
        payload.push(0);

        let err = decode_chunk(&payload, ChunkCoord::new(0, 0)).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidPaletteIndex { index: 7, len: 1 }));
    }

    #[test]
    fn test_invalid_bit_width_is_rejected() {
        let mut payload = Vec::new();
        put_u16(&mut payload, 1);
        put_string(&mut payload, "minecraft:stone", "block").unwrap();
        put_u16(&mut payload, 1);
        put_i32(&mut payload, 0);
        put_u16(&mut payload, 1);
        put_u32(&mut payload, 0);
        payload.push(3);

        let err = decode_chunk(&payload, ChunkCoord::new(0, 0)).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidBitWidth(3)));
    }

    #[test]
    fn test_index_outside_section_palette_is_rejected() {
        let mut payload = Vec::new();
        put_u16(&mut payload, 1);
        put_string(&mut payload, "minecraft:stone", "block").unwrap();
        put_u16(&mut payload, 1);
        put_i32(&mut payload, 0);
        put_u16(&mut payload, 1);
        put_u32(&mut payload, 0);
        payload.push(2);
        // Every 2-bit index is 3, past a palette of one.
        payload.extend(std::iter::repeat_n(0xFFu8, index_data_len(2)));

        let err = decode_chunk(&payload, ChunkCoord::new(0, 0)).unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::Section(SectionError::IndexOutOfPalette { index: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_section_is_rejected() {
        let mut payload = Vec::new();
        put_u16(&mut payload, 1);
        put_string(&mut payload, "minecraft:stone", "block").unwrap();
        put_u16(&mut payload, 2);
        for _ in 0..2 {
            put_i32(&mut payload, 4);
            put_u16(&mut payload, 1);
            put_u32(&mut payload, 0);
            payload.push(0);
        }

        let err = decode_chunk(&payload, ChunkCoord::new(0, 0)).unwrap_err();
        assert!(matches!(err, ConstructionError::DuplicateSection(4)));
    }

    #[test]
    fn test_encode_rejects_chunk_from_other_registry() {
        let mut registry = BlockRegistry::new();
        let chunk = sample_chunk(&mut registry);
        let other = BlockRegistry::new();

        let err = encode_chunk(&chunk, &other).unwrap_err();
        assert!(matches!(err, ConstructionError::Chunk(_)));
    }
}

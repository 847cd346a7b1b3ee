//! Palette-compressed storage for one 16×16×16 slice of a chunk column.
//!
//! A section keeps a small palette of [`BlockId`] values and a bit-packed
//! array of palette indices. The index width grows with the palette, so a
//! section made of a single block type stores no indices at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bit_packed::BitPackedArray;
use crate::registry::BlockId;

/// Side length of a section in blocks.
pub const SECTION_SIZE: usize = 16;

/// Number of blocks in a section (16³).
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// Raw section parts that do not describe a valid section.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionError {
    /// A section needs at least one palette entry.
    #[error("section palette is empty")]
    EmptyPalette,
    /// The palette has more entries than the index width can address.
    #[error("palette of {len} entries does not fit in {bits}-bit indices")]
    PaletteTooLarge {
        /// Palette length.
        len: usize,
        /// Index width in bits.
        bits: u8,
    },
    /// The index array does not cover exactly one section.
    #[error("index array holds {0} entries, expected 4096")]
    WrongLength(usize),
    /// An index points past the end of the palette.
    #[error("index {index} at position {position} is outside a palette of {palette_len}")]
    IndexOutOfPalette {
        /// Offending palette index.
        index: u16,
        /// Linear position of the block within the section.
        position: usize,
        /// Palette length.
        palette_len: usize,
    },
}

/// Palette-compressed 16×16×16 block storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Local palette; indices in `storage` point into it.
    palette: Vec<BlockId>,
    /// Packed palette indices, x varies fastest, then z, then y.
    storage: BitPackedArray,
}

impl Section {
    /// Creates a section filled with `fill`.
    pub fn new(fill: BlockId) -> Self {
        Self {
            palette: vec![fill],
            storage: BitPackedArray::new(0, SECTION_VOLUME),
        }
    }

    /// Builds a section from a palette and a packed index array.
    ///
    /// # Errors
    ///
    /// Returns a [`SectionError`] if the parts are inconsistent: an empty
    /// palette, a palette wider than the index width, an index array of the
    /// wrong length, or an index outside the palette.
    pub fn from_raw_parts(palette: Vec<BlockId>, storage: BitPackedArray) -> Result<Self, SectionError> {
        if palette.is_empty() {
            return Err(SectionError::EmptyPalette);
        }
        if storage.len() != SECTION_VOLUME {
            return Err(SectionError::WrongLength(storage.len()));
        }
        let bits = storage.bits();
        if bits < 16 && palette.len() > 1usize << bits {
            return Err(SectionError::PaletteTooLarge {
                len: palette.len(),
                bits,
            });
        }
        if bits > 0 {
            for position in 0..SECTION_VOLUME {
                let index = storage.get(position);
                if usize::from(index) >= palette.len() {
                    return Err(SectionError::IndexOutOfPalette {
                        index,
                        position,
                        palette_len: palette.len(),
                    });
                }
            }
        }
        Ok(Self { palette, storage })
    }

    /// Returns the block at `(x, y, z)`, each in `0..16`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        let index = Self::linear_index(x, y, z);
        self.palette[usize::from(self.storage.get(index))]
    }

    /// Sets the block at `(x, y, z)`, growing the palette as needed.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        let palette_index = self.palette_index_or_insert(block);
        self.storage.set(Self::linear_index(x, y, z), palette_index);
    }

    /// Local palette.
    pub fn palette(&self) -> &[BlockId] {
        &self.palette
    }

    /// Packed palette indices.
    pub fn storage(&self) -> &BitPackedArray {
        &self.storage
    }

    /// Current index width in bits.
    pub fn bit_width(&self) -> u8 {
        self.storage.bits()
    }

    /// Returns `true` if every block in the section is `block`.
    pub fn is_uniform(&self, block: BlockId) -> bool {
        self.bit_width() == 0 && self.palette[0] == block
    }

    /// Rewrites every palette entry through `map`.
    ///
    /// The indices are left untouched, so this is how a section moves from
    /// one registry's id space to another's.
    pub fn remap(&mut self, mut map: impl FnMut(BlockId) -> BlockId) {
        for entry in &mut self.palette {
            *entry = map(*entry);
        }
    }

    /// Drops unused and duplicate palette entries and narrows the index width.
    ///
    /// Scans all 4096 blocks, so call it once per section after bulk edits.
    pub fn compact(&mut self) {
        if self.bit_width() == 0 {
            self.palette.truncate(1);
            return;
        }

        let mut used = vec![false; self.palette.len()];
        for i in 0..SECTION_VOLUME {
            used[usize::from(self.storage.get(i))] = true;
        }

        let mut old_to_new = vec![0u16; self.palette.len()];
        let mut new_palette: Vec<BlockId> = Vec::new();
        for (old, &is_used) in used.iter().enumerate() {
            if !is_used {
                continue;
            }
            let id = self.palette[old];
            old_to_new[old] = match new_palette.iter().position(|&p| p == id) {
                Some(existing) => existing as u16,
                None => {
                    new_palette.push(id);
                    (new_palette.len() - 1) as u16
                }
            };
        }

        let bits = Self::bits_for_palette_size(new_palette.len());
        let mut storage = BitPackedArray::new(bits, SECTION_VOLUME);
        if bits > 0 {
            for i in 0..SECTION_VOLUME {
                storage.set(i, old_to_new[usize::from(self.storage.get(i))]);
            }
        }
        self.palette = new_palette;
        self.storage = storage;
    }

    /// Index width needed for a palette of `size` entries.
    pub fn bits_for_palette_size(size: usize) -> u8 {
        match size {
            0 | 1 => 0,
            2..=4 => 2,
            5..=16 => 4,
            17..=256 => 8,
            _ => 16,
        }
    }

    fn linear_index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < SECTION_SIZE && y < SECTION_SIZE && z < SECTION_SIZE);
        x + z * SECTION_SIZE + y * SECTION_SIZE * SECTION_SIZE
    }

    fn palette_index_or_insert(&mut self, block: BlockId) -> u16 {
        if let Some(index) = self.palette.iter().position(|&p| p == block) {
            return index as u16;
        }
        // Overwritten ids linger in the palette until compacted. At most
        // SECTION_VOLUME of them can be live, which keeps indices within u16.
        if self.palette.len() >= SECTION_VOLUME {
            self.compact();
        }
        let bits = Self::bits_for_palette_size(self.palette.len() + 1);
        if bits != self.bit_width() {
            self.storage = self.storage.resized(bits);
        }
        self.palette.push(block);
        (self.palette.len() - 1) as u16
    }
}

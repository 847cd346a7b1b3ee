//! Block registry, palette-compressed sections, and chunk columns for
//! imported voxel structures.

pub mod bit_packed;
pub mod chunk;
pub mod coords;
pub mod registry;
pub mod section;
pub mod selection;

pub use bit_packed::BitPackedArray;
pub use chunk::{Chunk, ChunkError, DecodedChunk};
pub use coords::{ChunkCoord, Dimension};
pub use registry::{
    BlockDescriptor, BlockId, BlockParseError, BlockRegistry, DEFAULT_NAMESPACE, RegistryToken,
};
pub use section::{SECTION_SIZE, SECTION_VOLUME, Section, SectionError};
pub use selection::{SelectionBox, SelectionGroup};

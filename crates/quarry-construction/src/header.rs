//! The container header: dimensions, selection and chunk table.
//!
//! ## Binary Layout
//!
//! | Size | Field |
//! |------|-------|
//! | 4 | Magic bytes `[0x51, 0x43, 0x4F, 0x4E]` ("QCON") |
//! | 1 | Format version (`u8`, currently 1) |
//! | 2 | Dimension count `D` (`u16`) |
//! | D × (2 + n) | Dimension names, each a `u16` byte length then UTF-8 |
//! | 4 | Selection box count `B` (`u32`) |
//! | B × 24 | Boxes as `min_x, min_y, min_z, max_x, max_y, max_z` (`i32`) |
//! | 4 | Chunk entry count `C` (`u32`) |
//! | C × 22 | Entries: dimension index `u16`, `cx` `i32`, `cz` `i32`, payload offset `u64`, payload length `u32` |
//!
//! All integers are little-endian. Payload offsets are absolute file
//! positions; payloads follow the header in entry order.

use std::io::Read;

use quarry_voxel::{ChunkCoord, Dimension, SelectionBox, SelectionGroup};

use crate::codec::{Decoder, prealloc, put_i32, put_string, put_u16, put_u32, put_u64};
use crate::error::ConstructionError;

/// Magic bytes identifying a construction container.
pub const MAGIC: [u8; 4] = *b"QCON";

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Encoded size of one chunk table entry.
const ENTRY_LEN: usize = 2 + 4 + 4 + 8 + 4;

/// Where one chunk's payload lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChunkEntry {
    pub(crate) dimension: u16,
    pub(crate) coord: ChunkCoord,
    pub(crate) offset: u64,
    pub(crate) len: u32,
}

/// Everything stored ahead of the chunk payloads.
#[derive(Debug, Default)]
pub(crate) struct Header {
    pub(crate) dimensions: Vec<Dimension>,
    pub(crate) selection: SelectionGroup,
    pub(crate) entries: Vec<ChunkEntry>,
}

impl Header {
    /// Parses a header from the start of a container.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::InvalidMagic`],
    /// [`ConstructionError::UnsupportedVersion`], truncation, bad UTF-8 in a
    /// dimension name, or an entry naming a dimension that is not listed.
    pub(crate) fn read<R: Read>(d: &mut Decoder<R>) -> Result<Self, ConstructionError> {
        let mut magic = [0u8; 4];
        for byte in &mut magic {
            *byte = d.u8("magic").map_err(|e| match e {
                ConstructionError::Truncated(_) => ConstructionError::InvalidMagic,
                other => other,
            })?;
        }
        if magic != MAGIC {
            return Err(ConstructionError::InvalidMagic);
        }
        let version = d.u8("format version")?;
        if version != FORMAT_VERSION {
            return Err(ConstructionError::UnsupportedVersion(version));
        }

        let dim_count = usize::from(d.u16("dimension count")?);
        let mut dimensions = prealloc(dim_count);
        for _ in 0..dim_count {
            dimensions.push(Dimension::new(d.string("dimension name")?));
        }

        let box_count = d.u32("selection box count")? as usize;
        let mut boxes = prealloc(box_count);
        for _ in 0..box_count {
            let mut v = [0i32; 6];
            for value in &mut v {
                *value = d.i32("selection box")?;
            }
            boxes.push(SelectionBox {
                min: [v[0], v[1], v[2]],
                max: [v[3], v[4], v[5]],
            });
        }

        let entry_count = d.u32("chunk entry count")? as usize;
        let mut entries = prealloc(entry_count);
        for _ in 0..entry_count {
            let dimension = d.u16("chunk entry")?;
            if usize::from(dimension) >= dimensions.len() {
                return Err(ConstructionError::UnknownDimensionIndex(dimension));
            }
            let cx = d.i32("chunk entry")?;
            let cz = d.i32("chunk entry")?;
            entries.push(ChunkEntry {
                dimension,
                coord: ChunkCoord::new(cx, cz),
                offset: d.u64("chunk entry")?,
                len: d.u32("chunk entry")?,
            });
        }

        Ok(Self {
            dimensions,
            selection: SelectionGroup::new(boxes),
            entries,
        })
    }

    /// Size in bytes of the encoded header, which is where the first
    /// payload starts.
    pub(crate) fn encoded_len(&self) -> usize {
        let names: usize = self.dimensions.iter().map(|d| 2 + d.as_str().len()).sum();
        4 + 1 + 2 + names + 4 + self.selection.boxes().len() * 24 + 4 + self.entries.len() * ENTRY_LEN
    }

    /// Appends the encoded header to `buf`.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::TooMany`] if a count overflows its field.
    pub(crate) fn write(&self, buf: &mut Vec<u8>) -> Result<(), ConstructionError> {
        buf.extend_from_slice(&MAGIC);
        buf.push(FORMAT_VERSION);

        let dims = u16::try_from(self.dimensions.len()).map_err(|_| ConstructionError::TooMany("dimensions"))?;
        put_u16(buf, dims);
        for dimension in &self.dimensions {
            put_string(buf, dimension.as_str(), "dimension name")?;
        }

        let boxes = self.selection.boxes();
        put_u32(buf, u32::try_from(boxes.len()).map_err(|_| ConstructionError::TooMany("selection"))?);
        for b in boxes {
            for value in b.min.iter().chain(b.max.iter()) {
                put_i32(buf, *value);
            }
        }

        put_u32(
            buf,
            u32::try_from(self.entries.len()).map_err(|_| ConstructionError::TooMany("chunk table"))?,
        );
        for entry in &self.entries {
            put_u16(buf, entry.dimension);
            put_i32(buf, entry.coord.x);
            put_i32(buf, entry.coord.z);
            put_u64(buf, entry.offset);
            put_u32(buf, entry.len);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            dimensions: vec![Dimension::new("main"), Dimension::new("nether")],
            selection: SelectionGroup::new(vec![SelectionBox::new([0, 0, 0], [31, 15, 15])]),
            entries: vec![
                ChunkEntry {
                    dimension: 0,
                    coord: ChunkCoord::new(0, 0),
                    offset: 100,
                    len: 10,
                },
                ChunkEntry {
                    dimension: 1,
                    coord: ChunkCoord::new(-1, 4),
                    offset: 110,
                    len: 20,
                },
            ],
        }
    }

    #[test]
    fn test_encoded_len_matches_written_bytes() {
        let header = sample();
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), header.encoded_len());
    }

    #[test]
    fn test_read_restores_header() {
        let header = sample();
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();

        let read = Header::read(&mut Decoder::new(&buf[..])).unwrap();
        assert_eq!(read.dimensions, header.dimensions);
        assert_eq!(read.selection, header.selection);
        assert_eq!(read.entries, header.entries);
    }

    #[test]
    fn test_wrong_magic_is_rejected() {
        let err = Header::read(&mut Decoder::new(&b"NVCK\x01"[..])).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidMagic));
        let err = Header::read(&mut Decoder::new(&b"QC"[..])).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidMagic));
    }

    #[test]
    fn test_read_failure_during_magic_is_io() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("device gone"))
            }
        }

        let err = Header::read(&mut Decoder::new(Broken)).unwrap_err();
        assert!(matches!(err, ConstructionError::Io(_)));
    }

    #[test]
    fn test_inverted_selection_box_is_kept() {
        let mut header = sample();
        let inverted = SelectionBox {
            min: [9, 9, 9],
            max: [-9, 0, 3],
        };
        header.selection = SelectionGroup::new(vec![inverted]);
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();

        let read = Header::read(&mut Decoder::new(&buf[..])).unwrap();
        assert_eq!(read.selection.boxes(), &[inverted]);
    }

    #[test]
    fn test_future_version_is_rejected() {
        let err = Header::read(&mut Decoder::new(&b"QCON\x02"[..])).unwrap_err();
        assert!(matches!(err, ConstructionError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_entry_with_unknown_dimension_is_rejected() {
        let mut header = sample();
        header.entries[1].dimension = 5;
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();

        let err = Header::read(&mut Decoder::new(&buf[..])).unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownDimensionIndex(5)));
    }

    #[test]
    fn test_truncated_table_is_rejected() {
        let header = sample();
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        buf.truncate(buf.len() - 3);

        let err = Header::read(&mut Decoder::new(&buf[..])).unwrap_err();
        assert!(matches!(err, ConstructionError::Truncated("chunk entry")));
    }
}

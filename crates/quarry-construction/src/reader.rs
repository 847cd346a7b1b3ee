//! Random-access reader over a construction container.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use quarry_import::{ChunkDecodeError, FormatOpener, FormatSource, SourceError, SourceOpenError};
use quarry_voxel::{ChunkCoord, DecodedChunk, Dimension, SelectionGroup};
use rustc_hash::FxHashMap;

use crate::codec::{Decoder, decode_chunk};
use crate::error::ConstructionError;
use crate::header::{ChunkEntry, Header};

/// An open construction file.
///
/// The header and chunk table are parsed on open; chunk payloads are read
/// and decoded on demand. The file handle is released by
/// [`close`](Self::close) or on drop.
#[derive(Debug)]
pub struct ConstructionReader {
    path: PathBuf,
    file: Option<BufReader<File>>,
    file_len: u64,
    header: Header,
    index: FxHashMap<(u16, ChunkCoord), usize>,
}

impl ConstructionReader {
    /// Opens `path` and parses its header.
    ///
    /// # Errors
    ///
    /// I/O failures, [`ConstructionError::NotAFile`] for directories and
    /// other non-regular files, and any header parse error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConstructionError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(ConstructionError::NotAFile(path.to_path_buf()));
        }

        let mut reader = BufReader::new(file);
        let header = Header::read(&mut Decoder::new(&mut reader))?;

        let mut index = FxHashMap::default();
        for (i, entry) in header.entries.iter().enumerate() {
            if index.insert((entry.dimension, entry.coord), i).is_some() {
                tracing::warn!(
                    coord = %entry.coord,
                    dimension = %header.dimensions[usize::from(entry.dimension)],
                    "duplicate chunk entry, using the last one"
                );
            }
        }

        tracing::debug!(
            path = %path.display(),
            dimensions = header.dimensions.len(),
            chunks = header.entries.len(),
            "opened construction file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(reader),
            file_len: meta.len(),
            header,
            index,
        })
    }

    /// Path the reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dimensions in file order.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.header.dimensions
    }

    /// Bounding selection stored in the header.
    pub fn selection(&self) -> &SelectionGroup {
        &self.header.selection
    }

    /// Total number of chunk entries across all dimensions.
    pub fn chunk_count(&self) -> usize {
        self.header.entries.len()
    }

    /// Coordinates stored for `dimension`, in table order, without
    /// duplicates.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::UnknownDimension`] if the file does not list it.
    pub fn chunk_coords(&self, dimension: &Dimension) -> Result<Vec<ChunkCoord>, ConstructionError> {
        let dim = self.dimension_index(dimension)?;
        Ok(self
            .header
            .entries
            .iter()
            .enumerate()
            .filter(|(i, e)| e.dimension == dim && self.index.get(&(dim, e.coord)) == Some(i))
            .map(|(_, e)| e.coord)
            .collect())
    }

    /// Reads and decodes the chunk at `coord`.
    ///
    /// A failure leaves the reader usable for other chunks.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::Closed`] after [`close`](Self::close),
    /// [`ConstructionError::UnknownDimension`],
    /// [`ConstructionError::MissingChunk`],
    /// [`ConstructionError::PayloadOutOfRange`], or any payload decode error.
    pub fn load_chunk(&mut self, coord: ChunkCoord, dimension: &Dimension) -> Result<DecodedChunk, ConstructionError> {
        let dim = self.dimension_index(dimension)?;
        let entry = self
            .index
            .get(&(dim, coord))
            .map(|&i| self.header.entries[i])
            .ok_or_else(|| ConstructionError::MissingChunk {
                coord,
                dimension: dimension.to_string(),
            })?;
        let payload = self.read_payload(entry)?;
        decode_chunk(&payload, coord)
    }

    /// Releases the file handle. Later chunk loads fail with
    /// [`ConstructionError::Closed`]; header queries keep working.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            tracing::trace!(path = %self.path.display(), "closed construction file");
        }
    }

    /// Returns `true` once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn dimension_index(&self, dimension: &Dimension) -> Result<u16, ConstructionError> {
        self.header
            .dimensions
            .iter()
            .position(|d| d == dimension)
            .map(|i| i as u16)
            .ok_or_else(|| ConstructionError::UnknownDimension(dimension.to_string()))
    }

    fn read_payload(&mut self, entry: ChunkEntry) -> Result<Vec<u8>, ConstructionError> {
        let end = entry.offset.checked_add(u64::from(entry.len));
        if end.is_none_or(|end| end > self.file_len) {
            return Err(ConstructionError::PayloadOutOfRange(entry.coord));
        }
        let file = self.file.as_mut().ok_or(ConstructionError::Closed)?;
        file.seek(SeekFrom::Start(entry.offset))?;
        let mut payload = vec![0u8; entry.len as usize];
        file.read_exact(&mut payload)?;
        Ok(payload)
    }
}

impl FormatSource for ConstructionReader {
    fn dimensions(&self) -> Result<Vec<Dimension>, SourceError> {
        Ok(self.header.dimensions.clone())
    }

    fn all_chunk_coordinates(&mut self, dimension: &Dimension) -> Result<Vec<ChunkCoord>, SourceError> {
        self.chunk_coords(dimension)
            .map_err(|e| SourceError::new("all_chunk_coordinates", e))
    }

    fn load_chunk(&mut self, coord: ChunkCoord, dimension: &Dimension) -> Result<DecodedChunk, ChunkDecodeError> {
        ConstructionReader::load_chunk(self, coord, dimension)
            .map_err(|e| ChunkDecodeError::new(coord, dimension.clone(), e))
    }

    fn selection(&self) -> Result<SelectionGroup, SourceError> {
        Ok(self.header.selection.clone())
    }

    fn close(&mut self) {
        ConstructionReader::close(self);
    }
}

/// Opens construction files as [`ConstructionReader`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstructionOpener;

impl FormatOpener for ConstructionOpener {
    type Source = ConstructionReader;

    fn open(&self, path: &Path) -> Result<ConstructionReader, SourceOpenError> {
        ConstructionReader::open(path).map_err(|e| SourceOpenError::new(path, e))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use quarry_voxel::{BlockDescriptor, BlockRegistry, Chunk, Section};

    use super::*;
    use crate::writer::ConstructionWriter;

    fn stone_chunk(registry: &mut BlockRegistry, coord: ChunkCoord) -> Chunk {
        let stone = registry.intern(&BlockDescriptor::new("minecraft", "stone"));
        let mut chunk = Chunk::new(coord, registry);
        chunk.insert_section(0, Section::new(stone));
        chunk
    }

    fn write_sample(dir: &Path) -> PathBuf {
        let mut registry = BlockRegistry::new();
        let main = Dimension::new("main");
        let mut writer = ConstructionWriter::new();
        writer.add_dimension(main.clone()).unwrap();
        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(1, 0), ChunkCoord::new(0, 1)] {
            let chunk = stone_chunk(&mut registry, coord);
            writer.add_chunk(&main, &chunk, &registry).unwrap();
        }
        let path = dir.join("sample.construction");
        writer.write_to(&path).unwrap();
        path
    }

    #[test]
    fn test_open_parses_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());

        let reader = ConstructionReader::open(&path).unwrap();
        assert_eq!(reader.path(), path.as_path());
        assert_eq!(reader.dimensions(), &[Dimension::new("main")]);
        assert_eq!(reader.chunk_count(), 3);
        assert!(!reader.is_closed());
    }

    #[test]
    fn test_chunk_coords_keep_table_order() {
        let dir = tempfile::tempdir().unwrap();
        let reader = ConstructionReader::open(write_sample(dir.path())).unwrap();

        let coords = reader.chunk_coords(&Dimension::new("main")).unwrap();
        assert_eq!(
            coords,
            vec![ChunkCoord::new(0, 0), ChunkCoord::new(1, 0), ChunkCoord::new(0, 1)]
        );
        assert!(matches!(
            reader.chunk_coords(&Dimension::new("end")),
            Err(ConstructionError::UnknownDimension(_))
        ));
    }

    #[test]
    fn test_load_chunk_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = ConstructionReader::open(write_sample(dir.path())).unwrap();
        let main = Dimension::new("main");

        assert!(reader.load_chunk(ChunkCoord::new(1, 0), &main).is_ok());
        reader.close();
        assert!(reader.is_closed());
        assert!(matches!(
            reader.load_chunk(ChunkCoord::new(1, 0), &main),
            Err(ConstructionError::Closed)
        ));
        // Header queries still answer.
        assert_eq!(reader.dimensions().len(), 1);
    }

    #[test]
    fn test_missing_chunk_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = ConstructionReader::open(write_sample(dir.path())).unwrap();

        let err = reader
            .load_chunk(ChunkCoord::new(9, 9), &Dimension::new("main"))
            .unwrap_err();
        assert!(matches!(err, ConstructionError::MissingChunk { .. }));
    }

    #[test]
    fn test_truncated_file_fails_only_the_cut_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let len = std::fs::metadata(&path).unwrap().len();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 1).unwrap();
        drop(file);

        let mut reader = ConstructionReader::open(&path).unwrap();
        let main = Dimension::new("main");
        assert!(reader.load_chunk(ChunkCoord::new(0, 0), &main).is_ok());
        assert!(matches!(
            reader.load_chunk(ChunkCoord::new(0, 1), &main),
            Err(ConstructionError::PayloadOutOfRange(_))
        ));
        assert!(reader.load_chunk(ChunkCoord::new(1, 0), &main).is_ok());
    }

    #[test]
    fn test_open_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.construction");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello world")
            .unwrap();

        assert!(matches!(
            ConstructionReader::open(&path),
            Err(ConstructionError::InvalidMagic)
        ));
    }

    #[test]
    fn test_open_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConstructionReader::open(dir.path()).unwrap_err();
        // Some platforms refuse to open a directory at all.
        assert!(matches!(
            err,
            ConstructionError::NotAFile(_) | ConstructionError::Io(_)
        ));
    }

    #[test]
    fn test_opener_wraps_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.construction");

        let err = ConstructionOpener.open(&path).unwrap_err();
        assert_eq!(err.path, path);
    }
}

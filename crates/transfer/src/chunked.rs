use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tubelift_protocol::constants::CHUNK_GRANULARITY;

use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// A contiguous byte range of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset of `data[0]` within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

impl Chunk {
    /// Number of bytes in this chunk.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Rounds a requested chunk size up to the service's 256 KiB granularity.
///
/// `0` selects [`DEFAULT_CHUNK_SIZE`].
pub fn normalize_chunk_size(requested: usize) -> usize {
    if requested == 0 {
        return DEFAULT_CHUNK_SIZE;
    }
    requested.div_ceil(CHUNK_GRANULARITY) * CHUNK_GRANULARITY
}

/// Reads fixed-size chunks at arbitrary offsets.
///
/// Unlike a sequential reader, every read seeks first: the service decides
/// where the next chunk starts, not the local cursor.
pub struct ChunkReader<R = File> {
    source: R,
    len: u64,
    chunk_size: usize,
}

impl ChunkReader<File> {
    /// Opens `path` and records its length.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::from_reader(file, len, chunk_size))
    }
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Wraps an already-open source of `len` bytes.
    pub fn from_reader(source: R, len: u64, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            source,
            len,
            chunk_size,
        }
    }

    /// Reads up to `chunk_size` bytes starting at `offset`.
    ///
    /// Returns an empty chunk at `offset == len`.
    pub fn read_chunk(&mut self, offset: u64) -> Result<Chunk, TransferError> {
        if offset > self.len {
            return Err(TransferError::OffsetBeyondEnd {
                offset,
                len: self.len,
            });
        }

        let expected = (self.len - offset).min(self.chunk_size as u64);
        self.source.seek(SeekFrom::Start(offset))?;

        let mut data = Vec::with_capacity(expected as usize);
        (&mut self.source).take(expected).read_to_end(&mut data)?;

        if (data.len() as u64) < expected {
            return Err(TransferError::ShortRead {
                offset,
                expected,
                read: data.len() as u64,
            });
        }

        Ok(Chunk { offset, data })
    }

    /// Total source length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn open_records_length() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "clip.mp4", b"0123456789");

        let reader = ChunkReader::open(&path, 4).unwrap();
        assert_eq!(reader.len(), 10);
        assert_eq!(reader.chunk_size(), 4);
        assert!(!reader.is_empty());
    }

    #[test]
    fn open_missing_file_fails() {
        let result = ChunkReader::open(Path::new("/nonexistent/clip.mp4"), 4);
        assert!(matches!(result, Err(TransferError::Io(_))));
    }

    #[test]
    fn reads_at_arbitrary_offsets() {
        let mut reader = ChunkReader::from_reader(Cursor::new(b"AABBCCDDEE".to_vec()), 10, 4);

        let c = reader.read_chunk(0).unwrap();
        assert_eq!(c.data, b"AABB");
        assert_eq!(c.len(), 4);

        // Service may acknowledge fewer bytes than sent; re-read from there.
        let c = reader.read_chunk(3).unwrap();
        assert_eq!(c.offset, 3);
        assert_eq!(c.data, b"BCCD");

        let c = reader.read_chunk(8).unwrap();
        assert_eq!(c.data, b"EE");
        assert_eq!(c.offset + c.len(), 10);
    }

    #[test]
    fn read_at_end_is_empty() {
        let mut reader = ChunkReader::from_reader(Cursor::new(b"abc".to_vec()), 3, 4);
        let c = reader.read_chunk(3).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn read_beyond_end_fails() {
        let mut reader = ChunkReader::from_reader(Cursor::new(b"abc".to_vec()), 3, 4);
        assert!(matches!(
            reader.read_chunk(4),
            Err(TransferError::OffsetBeyondEnd { offset: 4, len: 3 })
        ));
    }

    #[test]
    fn truncated_source_reports_short_read() {
        // Declared length is larger than the actual data.
        let mut reader = ChunkReader::from_reader(Cursor::new(b"abc".to_vec()), 10, 8);
        assert!(matches!(
            reader.read_chunk(0),
            Err(TransferError::ShortRead { expected: 8, read: 3, .. })
        ));
    }

    #[test]
    fn zero_chunk_size_uses_default() {
        let reader = ChunkReader::from_reader(Cursor::new(Vec::new()), 0, 0);
        assert_eq!(reader.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert!(reader.is_empty());
    }

    #[test]
    fn normalize_rounds_up_to_granularity() {
        assert_eq!(normalize_chunk_size(0), DEFAULT_CHUNK_SIZE);
        assert_eq!(normalize_chunk_size(1), CHUNK_GRANULARITY);
        assert_eq!(normalize_chunk_size(CHUNK_GRANULARITY), CHUNK_GRANULARITY);
        assert_eq!(normalize_chunk_size(CHUNK_GRANULARITY + 1), 2 * CHUNK_GRANULARITY);
    }
}

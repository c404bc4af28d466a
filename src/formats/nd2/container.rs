//! ND2 chunk map reader.
//!
//! Modern ND2 files are a sequence of chunks, each opening with a 16-byte
//! header:
//!
//! | bytes | content                                   |
//! |-------|-------------------------------------------|
//! | 4     | magic `0x0ABECEDA` (little-endian `u32`)  |
//! | 4     | length of the name region that follows    |
//! | 8     | data length                               |
//!
//! The file ends with the chunk map signature and the `u64` offset of the
//! chunk map, which lists every chunk as a `!`-terminated name followed by
//! its offset and size.
//!
//! Files that open with a JPEG 2000 signature box are the legacy layout and
//! are rejected as unsupported.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use crate::error::ExtractionCause;

/// Magic opening every chunk of a modern ND2 file.
pub const CHUNK_MAGIC: u32 = 0x0ABE_CEDA;
/// First four bytes of a legacy (JPEG 2000) ND2 file, read little-endian.
pub const LEGACY_MAGIC: u32 = 0x0C00_0000;
/// Signature preceding the chunk map offset at the end of the file.
pub const CHUNK_MAP_SIGNATURE: &[u8; 32] = b"ND2 CHUNK MAP SIGNATURE 0000001!";
/// Length of the chunk header preceding the name region.
pub const CHUNK_HEADER_LEN: u64 = 16;

const TRAILER_LEN: u64 = 40;

/// One entry of the chunk map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    /// Chunk name including the trailing `!`
    pub name: String,
    /// Offset of the chunk header
    pub offset: u64,
    /// Size recorded in the map
    pub size: u64,
}

/// Reader over the chunks of an ND2 file.
pub struct Nd2Container<R> {
    reader: R,
    len: u64,
    chunks: Vec<ChunkEntry>,
}

impl Nd2Container<BufReader<File>> {
    /// Open the ND2 file at `path` and read its chunk map.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractionCause> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> Nd2Container<R> {
    /// Validate the leading chunk and read the chunk map.
    pub fn new(mut reader: R) -> Result<Self, ExtractionCause> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let magic = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| ExtractionCause::InvalidContainer("file too short for ND2".to_string()))?;
        match magic {
            CHUNK_MAGIC => {}
            LEGACY_MAGIC => {
                return Err(ExtractionCause::UnsupportedFormat(
                    "legacy JPEG 2000 ND2 layout".to_string(),
                ))
            }
            other => {
                return Err(ExtractionCause::InvalidContainer(format!(
                    "ND2 chunk magic 0x{:08X} is not 0x{:08X}",
                    other, CHUNK_MAGIC
                )))
            }
        }

        if len < TRAILER_LEN {
            return Err(ExtractionCause::InvalidContainer(
                "file too short for an ND2 chunk map".to_string(),
            ));
        }
        reader.seek(SeekFrom::Start(len - TRAILER_LEN))?;
        let mut signature = [0u8; 32];
        reader.read_exact(&mut signature)?;
        if &signature != CHUNK_MAP_SIGNATURE {
            return Err(ExtractionCause::InvalidContainer(
                "ND2 chunk map signature not found".to_string(),
            ));
        }
        let map_offset = reader.read_u64::<LittleEndian>()?;

        let mut container = Self {
            reader,
            len,
            chunks: Vec::new(),
        };
        let map = container.read_chunk_at(map_offset)?;
        container.chunks = parse_chunk_map(&map)?;
        debug!("ND2 chunk map lists {} chunks", container.chunks.len());
        Ok(container)
    }

    /// Chunks listed in the chunk map, in map order.
    pub fn chunks(&self) -> &[ChunkEntry] {
        &self.chunks
    }

    /// Read the data of the chunk called `name`.
    ///
    /// Returns `Ok(None)` when the chunk map does not list it.
    pub fn read_chunk(&mut self, name: &str) -> Result<Option<Vec<u8>>, ExtractionCause> {
        let Some(offset) = self
            .chunks
            .iter()
            .find(|chunk| chunk.name == name)
            .map(|chunk| chunk.offset)
        else {
            return Ok(None);
        };
        self.read_chunk_at(offset).map(Some)
    }

    fn read_chunk_at(&mut self, offset: u64) -> Result<Vec<u8>, ExtractionCause> {
        if offset.saturating_add(CHUNK_HEADER_LEN) > self.len {
            return Err(ExtractionCause::InvalidContainer(format!(
                "ND2 chunk offset {} beyond end of file",
                offset
            )));
        }
        self.reader.seek(SeekFrom::Start(offset))?;
        let magic = self.reader.read_u32::<LittleEndian>()?;
        if magic != CHUNK_MAGIC {
            return Err(ExtractionCause::InvalidContainer(format!(
                "no chunk magic at offset {}",
                offset
            )));
        }
        let name_len = self.reader.read_u32::<LittleEndian>()?;
        let data_len = self.reader.read_u64::<LittleEndian>()?;

        let start = offset + CHUNK_HEADER_LEN + u64::from(name_len);
        if start.saturating_add(data_len) > self.len {
            return Err(ExtractionCause::InvalidContainer(format!(
                "ND2 chunk at {} claims {} bytes beyond end of file",
                offset, data_len
            )));
        }
        self.reader.seek(SeekFrom::Start(start))?;
        let mut data = vec![0u8; data_len as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }
}

/// Parse the chunk map payload into its entries.
///
/// The map ends at the entry named with the chunk map signature.
pub fn parse_chunk_map(data: &[u8]) -> Result<Vec<ChunkEntry>, ExtractionCause> {
    let truncated = || ExtractionCause::InvalidContainer("truncated ND2 chunk map".to_string());

    let mut entries = Vec::new();
    let mut cursor = Cursor::new(data);
    loop {
        let start = cursor.position() as usize;
        let Some(end) = data[start.min(data.len())..].iter().position(|&b| b == b'!') else {
            return Err(truncated());
        };
        let name_bytes = &data[start..start + end + 1];
        if name_bytes == CHUNK_MAP_SIGNATURE {
            break;
        }
        let name = std::str::from_utf8(name_bytes)?.to_string();
        cursor.set_position((start + end + 1) as u64);
        let offset = cursor.read_u64::<LittleEndian>().map_err(|_| truncated())?;
        let size = cursor.read_u64::<LittleEndian>().map_err(|_| truncated())?;
        entries.push(ChunkEntry { name, offset, size });
    }
    Ok(entries)
}

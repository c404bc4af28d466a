//! ZISRAW container reader.
//!
//! A CZI file is a sequence of segments, each starting with a 32-byte
//! header: a 16-byte ASCII id padded with NUL bytes, then the allocated and
//! used sizes of the segment data as little-endian `i64`. The first segment
//! (`ZISRAWFILE`) records the absolute position of the metadata segment
//! (`ZISRAWMETADATA`), whose data starts with the XML length followed by a
//! fixed 256-byte preamble and then the UTF-8 XML document.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::ExtractionCause;

/// Segment id of the file header.
pub const FILE_SEGMENT_ID: &str = "ZISRAWFILE";
/// Segment id of the metadata segment.
pub const METADATA_SEGMENT_ID: &str = "ZISRAWMETADATA";

/// Length of a segment header.
pub const SEGMENT_HEADER_LEN: u64 = 32;
/// Length of the metadata segment preamble (sizes plus spare bytes).
pub const METADATA_PREAMBLE_LEN: u64 = 256;

/// A segment header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Segment id with NUL padding removed
    pub id: String,
    /// Bytes allocated for the segment data
    pub allocated_size: i64,
    /// Bytes of segment data in use
    pub used_size: i64,
}

/// The fields of the `ZISRAWFILE` segment this crate needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Format major version
    pub major: i32,
    /// Format minor version
    pub minor: i32,
    /// Absolute position of the subblock directory segment
    pub directory_position: i64,
    /// Absolute position of the metadata segment (0 when absent)
    pub metadata_position: i64,
    /// Absolute position of the attachment directory segment
    pub attachment_directory_position: i64,
}

/// An open CZI container.
///
/// The underlying reader is owned and released when the container is
/// dropped.
pub struct CziContainer<R> {
    reader: R,
    len: u64,
    header: FileHeader,
}

impl CziContainer<BufReader<File>> {
    /// Open a CZI file and read its file header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractionCause> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> CziContainer<R> {
    /// Read the file header from a seekable source.
    pub fn new(mut reader: R) -> Result<Self, ExtractionCause> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let segment = read_segment_header(&mut reader).map_err(|_| {
            ExtractionCause::InvalidContainer("file too short for a ZISRAW header".to_string())
        })?;
        if segment.id != FILE_SEGMENT_ID {
            return Err(ExtractionCause::InvalidContainer(format!(
                "expected {} segment, found {:?}",
                FILE_SEGMENT_ID, segment.id
            )));
        }

        let header = read_file_header(&mut reader).map_err(|_| {
            ExtractionCause::InvalidContainer("truncated ZISRAWFILE segment".to_string())
        })?;

        Ok(Self {
            reader,
            len,
            header,
        })
    }

    /// The parsed file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Read the embedded metadata XML document.
    pub fn read_metadata_xml(&mut self) -> Result<String, ExtractionCause> {
        let position = self.header.metadata_position;
        if position <= 0 {
            return Err(ExtractionCause::MissingMetadata(
                "file header has no metadata segment".to_string(),
            ));
        }
        let position = position as u64;
        if position.saturating_add(SEGMENT_HEADER_LEN + METADATA_PREAMBLE_LEN) > self.len {
            return Err(ExtractionCause::InvalidContainer(format!(
                "metadata segment position {} is beyond end of file ({} bytes)",
                position, self.len
            )));
        }

        self.reader.seek(SeekFrom::Start(position))?;
        let segment = read_segment_header(&mut self.reader)?;
        if segment.id != METADATA_SEGMENT_ID {
            return Err(ExtractionCause::InvalidContainer(format!(
                "expected {} segment at {}, found {:?}",
                METADATA_SEGMENT_ID, position, segment.id
            )));
        }

        let xml_size = self.reader.read_i32::<LittleEndian>()?;
        let _attachment_size = self.reader.read_i32::<LittleEndian>()?;
        let xml_start = position + SEGMENT_HEADER_LEN + METADATA_PREAMBLE_LEN;
        if xml_size <= 0 {
            return Err(ExtractionCause::MissingMetadata(
                "metadata segment holds no XML".to_string(),
            ));
        }
        if xml_start.saturating_add(xml_size as u64) > self.len {
            return Err(ExtractionCause::InvalidContainer(format!(
                "metadata XML of {} bytes overruns end of file",
                xml_size
            )));
        }

        self.reader.seek(SeekFrom::Start(xml_start))?;
        let mut xml = vec![0u8; xml_size as usize];
        self.reader.read_exact(&mut xml)?;

        // Writers pad the block with NULs
        while xml.last() == Some(&0) {
            xml.pop();
        }
        String::from_utf8(xml).map_err(|e| ExtractionCause::from(e.utf8_error()))
    }
}

/// Read a 32-byte segment header at the current position.
pub fn read_segment_header<R: Read>(reader: &mut R) -> std::io::Result<SegmentHeader> {
    let mut id = [0u8; 16];
    reader.read_exact(&mut id)?;
    let end = id.iter().position(|&b| b == 0).unwrap_or(id.len());
    let id = String::from_utf8_lossy(&id[..end]).into_owned();

    Ok(SegmentHeader {
        id,
        allocated_size: reader.read_i64::<LittleEndian>()?,
        used_size: reader.read_i64::<LittleEndian>()?,
    })
}

fn read_file_header<R: Read>(reader: &mut R) -> std::io::Result<FileHeader> {
    let major = reader.read_i32::<LittleEndian>()?;
    let minor = reader.read_i32::<LittleEndian>()?;
    let _reserved1 = reader.read_i32::<LittleEndian>()?;
    let _reserved2 = reader.read_i32::<LittleEndian>()?;
    let mut guids = [0u8; 32];
    reader.read_exact(&mut guids)?;
    let _file_part = reader.read_i32::<LittleEndian>()?;
    let directory_position = reader.read_i64::<LittleEndian>()?;
    let metadata_position = reader.read_i64::<LittleEndian>()?;
    let _update_pending = reader.read_i32::<LittleEndian>()?;
    let attachment_directory_position = reader.read_i64::<LittleEndian>()?;

    Ok(FileHeader {
        major,
        minor,
        directory_position,
        metadata_position,
        attachment_directory_position,
    })
}

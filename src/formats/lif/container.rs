//! LIF container header reader.
//!
//! A LIF file opens with a memory block holding the XML header:
//!
//! | bytes | content                                  |
//! |-------|------------------------------------------|
//! | 4     | test value `0x70` (little-endian `u32`)  |
//! | 4     | length of the block that follows         |
//! | 1     | marker `0x2A`                            |
//! | 4     | number of UTF-16 code units in the XML   |
//! | 2n    | XML header, UTF-16LE                     |
//!
//! Image pixel blocks follow and are not read.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::ExtractionCause;

/// Test value opening every LIF file.
pub const LIF_TEST_VALUE: u32 = 0x70;
/// Marker byte preceding the XML character count.
pub const LIF_MARKER: u8 = 0x2A;

/// Upper bound on the XML header size accepted, in UTF-16 code units.
const MAX_XML_CHARS: u32 = 256 * 1024 * 1024;

/// Read the XML header of the LIF file at `path`.
pub fn read_xml_header_file(path: &Path) -> Result<String, ExtractionCause> {
    let file = File::open(path)?;
    read_xml_header(BufReader::new(file))
}

/// Read the XML header from the start of a LIF stream.
pub fn read_xml_header<R: Read>(mut reader: R) -> Result<String, ExtractionCause> {
    let truncated = |_| ExtractionCause::InvalidContainer("truncated LIF header".to_string());

    let test_value = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    if test_value != LIF_TEST_VALUE {
        return Err(ExtractionCause::InvalidContainer(format!(
            "LIF test value 0x{:X} is not 0x{:X}",
            test_value, LIF_TEST_VALUE
        )));
    }
    let _block_len = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    let marker = reader.read_u8().map_err(truncated)?;
    if marker != LIF_MARKER {
        return Err(ExtractionCause::InvalidContainer(format!(
            "LIF marker 0x{:X} is not 0x{:X}",
            marker, LIF_MARKER
        )));
    }

    let chars = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    if chars == 0 {
        return Err(ExtractionCause::MissingMetadata("empty LIF XML header".to_string()));
    }
    if chars > MAX_XML_CHARS {
        return Err(ExtractionCause::InvalidContainer(format!(
            "LIF XML header of {} characters is implausibly large",
            chars
        )));
    }

    let mut units = Vec::with_capacity(chars as usize);
    for _ in 0..chars {
        units.push(reader.read_u16::<LittleEndian>().map_err(truncated)?);
    }
    let xml = String::from_utf16(&units)?;
    Ok(xml.trim_end_matches('\0').to_string())
}

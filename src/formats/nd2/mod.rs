//! Nikon ND2 support.
//!
//! Only the chunked ND2 layout is read; legacy JPEG 2000 files are reported
//! as unsupported. The metadata chunks are located through the chunk map
//! ([`container::Nd2Container`]), decoded ([`clx::decode`]) and collected
//! into one tree keyed by chunk name, which [`extract::extract_from_tree`]
//! reduces.
//!
//! A chunk that cannot be read or decoded is logged and left out of the
//! tree; only its own fields go missing.

pub mod clx;
pub mod container;
pub mod extract;


use std::path::Path;

use log::{debug, warn};

use crate::error::{ExtractionCause, MetadataExtractionError};
use crate::formats::{file_stem, Extraction, FileFormat, MetadataExtractor};
use crate::tree::{parse_xml, RawMap, RawNode};

pub use container::Nd2Container;
pub use extract::{chunk, extract_from_tree};

/// Extractor for Nikon ND2 files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nd2Extractor;

impl Nd2Extractor {
    /// Read and decode the metadata chunks.
    ///
    /// Fails when the container itself is unreadable or when not one
    /// metadata chunk could be decoded.
    pub fn read_tree(path: &Path) -> Result<RawNode, ExtractionCause> {
        let mut container = Nd2Container::open(path)?;
        let mut tree = RawMap::new();

        for &name in chunk::DESCRIPTOR_CHUNKS {
            match container.read_chunk(name).and_then(|data| data.map(|d| clx::decode(&d)).transpose()) {
                Ok(Some(node)) => tree.insert(name, node),
                Ok(None) => debug!("ND2 chunk {} not present", name),
                Err(e) => warn!("Skipping ND2 chunk {}: {}", name, e),
            }
        }

        match container.read_chunk(chunk::APP_INFO).and_then(|data| data.map(|d| decode_xml_chunk(&d)).transpose()) {
            Ok(Some(node)) => tree.insert(chunk::APP_INFO, node),
            Ok(None) => debug!("ND2 chunk {} not present", chunk::APP_INFO),
            Err(e) => warn!("Skipping ND2 chunk {}: {}", chunk::APP_INFO, e),
        }

        if tree.is_empty() {
            return Err(ExtractionCause::MissingMetadata(
                "no readable ND2 metadata chunk".to_string(),
            ));
        }
        Ok(RawNode::Map(tree))
    }
}

/// Parse an XML chunk, which may be UTF-8 or UTF-16LE with a byte order mark.
fn decode_xml_chunk(data: &[u8]) -> Result<RawNode, ExtractionCause> {
    let xml = match data {
        [0xFF, 0xFE, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)?
        }
        _ => std::str::from_utf8(data)?.trim_start_matches('\u{feff}').to_string(),
    };
    parse_xml(xml.trim_end_matches('\0'))
}

impl MetadataExtractor for Nd2Extractor {
    fn format(&self) -> FileFormat {
        FileFormat::Nd2
    }

    fn extract(&self, path: &Path) -> Result<Extraction, MetadataExtractionError> {
        let tree = Self::read_tree(path).map_err(|cause| MetadataExtractionError::new(path, cause))?;
        let stem = file_stem(path);
        let output = extract_from_tree(&tree, stem.as_deref());

        Ok(Extraction {
            format: FileFormat::Nd2,
            output,
            raw: tree,
        })
    }
}

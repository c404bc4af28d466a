//! Zeiss CZI support.
//!
//! The metadata XML is read out of the ZISRAW container by
//! [`container::CziContainer`] and reduced by [`extract::extract_from_tree`].
//!
//! Notable rules:
//!
//! - the system name falls back to the hardware configuration's device list
//!   (a device with id `Microscope` first, then any named device)
//! - pixel sizes fall back from scan-mode scaling to the scaling distance
//!   list; a zero size is treated as unset on both paths
//! - `Size C` counts distinct channel references across all tracks
//! - detector attributes are correlated to channels by name, and a filter
//!   set on an Airyscan (`ChA`) detector replaces the emission range

pub mod container;
pub mod extract;


use std::path::Path;

use log::debug;

use crate::error::{ExtractionCause, MetadataExtractionError};
use crate::formats::{file_stem, Extraction, FileFormat, MetadataExtractor};
use crate::tree::{parse_xml, RawNode};

pub use container::CziContainer;
pub use extract::extract_from_tree;

/// Extractor for Zeiss CZI files.
#[derive(Debug, Clone, Copy, Default)]
pub struct CziExtractor;

impl CziExtractor {
    /// Read and parse the embedded metadata tree.
    pub fn read_tree(path: &Path) -> Result<RawNode, ExtractionCause> {
        let xml = {
            let mut container = CziContainer::open(path)?;
            debug!(
                "CZI version {}.{}, metadata at {}",
                container.header().major,
                container.header().minor,
                container.header().metadata_position
            );
            container.read_metadata_xml()?
        };

        let tree = parse_xml(&xml)?;
        if tree.path(&["ImageDocument", "Metadata"]).is_none() {
            return Err(ExtractionCause::MissingMetadata(
                "no ImageDocument/Metadata element".to_string(),
            ));
        }
        Ok(tree)
    }
}

impl MetadataExtractor for CziExtractor {
    fn format(&self) -> FileFormat {
        FileFormat::Czi
    }

    fn extract(&self, path: &Path) -> Result<Extraction, MetadataExtractionError> {
        let tree = Self::read_tree(path).map_err(|cause| MetadataExtractionError::new(path, cause))?;
        let stem = file_stem(path);
        let output = extract_from_tree(&tree, stem.as_deref());

        Ok(Extraction {
            format: FileFormat::Czi,
            output,
            raw: tree,
        })
    }
}

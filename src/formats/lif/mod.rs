//! Leica LIF support.
//!
//! A LIF file is a project holding one or more images. The XML header is
//! read by [`container::read_xml_header`]; each image element is then
//! reduced independently by [`extract::extract_image`].
//!
//! [`LifExtractor`] reports a single image, selected by index. Use
//! [`LifExtractor::extract_images`] to reduce every image of a project.

pub mod container;
pub mod extract;


use std::path::Path;

use log::{debug, info};

use crate::error::{ExtractionCause, MetadataExtractionError};
use crate::formats::{file_stem, Extraction, FileFormat, MetadataExtractor};
use crate::schema::MetadataOutput;
use crate::tree::{parse_xml, RawNode};

pub use extract::{extract_image, find_images, LifImage};

/// Extractor for Leica LIF projects.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifExtractor {
    /// Index of the image to report (0-based, document order)
    pub image_index: usize,
}

impl LifExtractor {
    /// Extractor reporting the image at `image_index`.
    pub fn with_image(image_index: usize) -> Self {
        Self { image_index }
    }

    /// Read and parse the XML header.
    pub fn read_tree(path: &Path) -> Result<RawNode, ExtractionCause> {
        let xml = container::read_xml_header_file(path)?;
        debug!("LIF header of {} characters", xml.len());

        let tree = parse_xml(&xml)?;
        if tree.path(&["LMSDataContainerHeader"]).is_none() {
            return Err(ExtractionCause::MissingMetadata(
                "no LMSDataContainerHeader element".to_string(),
            ));
        }
        Ok(tree)
    }

    /// Reduce every image of the project, in document order.
    pub fn extract_images(path: &Path) -> Result<Vec<MetadataOutput>, MetadataExtractionError> {
        let tree = Self::read_tree(path).map_err(|cause| MetadataExtractionError::new(path, cause))?;
        let stem = file_stem(path);
        let outputs: Vec<MetadataOutput> = find_images(&tree)
            .iter()
            .map(|image| extract_image(&tree, image, stem.as_deref()))
            .collect();
        info!("{}: {} LIF images", path.display(), outputs.len());
        Ok(outputs)
    }
}

impl MetadataExtractor for LifExtractor {
    fn format(&self) -> FileFormat {
        FileFormat::Lif
    }

    fn extract(&self, path: &Path) -> Result<Extraction, MetadataExtractionError> {
        let tree = Self::read_tree(path).map_err(|cause| MetadataExtractionError::new(path, cause))?;

        let images = find_images(&tree);
        let Some(image) = images.get(self.image_index) else {
            let cause = if images.is_empty() {
                ExtractionCause::MissingMetadata("project contains no images".to_string())
            } else {
                ExtractionCause::MissingMetadata(format!(
                    "image index {} out of range, project has {} images",
                    self.image_index,
                    images.len()
                ))
            };
            return Err(MetadataExtractionError::new(path, cause));
        };
        debug!(
            "Reporting LIF image {} of {} ({})",
            image.index + 1,
            images.len(),
            image.name().unwrap_or_default()
        );

        let stem = file_stem(path);
        let output = extract_image(&tree, image, stem.as_deref());

        Ok(Extraction {
            format: FileFormat::Lif,
            output,
            raw: tree,
        })
    }
}

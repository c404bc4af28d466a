//! Vendor container readers and metadata extractors.
//!
//! Each vendor module pairs a container reader, which locates and decodes the
//! embedded metadata block into a [`RawNode`] tree, with an extractor that
//! reduces the tree to the common schema:
//!
//! - [`czi`] - Zeiss ZISRAW containers (embedded XML)
//! - [`lif`] - Leica LIF containers (embedded UTF-16 XML, one or more images)
//! - [`nd2`] - Nikon ND2 containers (chunk map and CLX binary descriptors)
//!
//! Callers normally go through [`extract_file`], which picks the extractor
//! from the file extension.

pub mod correlate;
pub mod czi;
pub mod lif;
pub mod nd2;

use std::fmt;
use std::path::Path;

use log::info;

use crate::error::{ExtractionCause, MetadataExtractionError};
use crate::schema::MetadataOutput;
use crate::tree::RawNode;

/// Supported vendor formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Zeiss CZI
    Czi,
    /// Leica LIF
    Lif,
    /// Nikon ND2
    Nd2,
}

impl FileFormat {
    /// Derive the format from a file extension (case-insensitive).
    ///
    /// The extension is trusted; file contents are not sniffed.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "czi" => Some(FileFormat::Czi),
            "lif" => Some(FileFormat::Lif),
            "nd2" => Some(FileFormat::Nd2),
            _ => None,
        }
    }

    /// Canonical file extension, with the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Czi => ".czi",
            FileFormat::Lif => ".lif",
            FileFormat::Nd2 => ".nd2",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Czi => "CZI",
            FileFormat::Lif => "LIF",
            FileFormat::Nd2 => "ND2",
        })
    }
}

impl serde::Serialize for FileFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of one successful extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The vendor format that was read
    pub format: FileFormat,
    /// Normalized fields in vendor-declared order
    pub output: MetadataOutput,
    /// The vendor-native tree the output was derived from
    pub raw: RawNode,
}

/// Reads one vendor format.
///
/// Implementations open the container for the duration of the call only and
/// release it on every exit path.
pub trait MetadataExtractor {
    /// The format this extractor reads.
    fn format(&self) -> FileFormat;

    /// Extract normalized metadata from the file at `path`.
    fn extract(&self, path: &Path) -> Result<Extraction, MetadataExtractionError>;
}

/// The default extractor for a format.
pub fn extractor_for(format: FileFormat) -> Box<dyn MetadataExtractor> {
    match format {
        FileFormat::Czi => Box::new(czi::CziExtractor),
        FileFormat::Lif => Box::new(lif::LifExtractor::default()),
        FileFormat::Nd2 => Box::new(nd2::Nd2Extractor),
    }
}

/// Extract metadata, choosing the format from the file extension.
pub fn extract_file(path: impl AsRef<Path>) -> Result<Extraction, MetadataExtractionError> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path).ok_or_else(|| {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        MetadataExtractionError::new(
            path,
            ExtractionCause::UnsupportedFormat(format!(
                "unrecognized file extension {:?}",
                extension
            )),
        )
    })?;
    extract_with_format(path, format)
}

/// Extract metadata with an explicit format.
pub fn extract_with_format(
    path: impl AsRef<Path>,
    format: FileFormat,
) -> Result<Extraction, MetadataExtractionError> {
    let path = path.as_ref();
    let extraction = extractor_for(format).extract(path)?;
    info!(
        "Extracted {} fields from {} file {}",
        extraction.output.len(),
        format,
        path.display()
    );
    Ok(extraction)
}

/// File name without extension, used when a container does not name its
/// document.
pub(crate) fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a/b/cells.czi")), Some(FileFormat::Czi));
        assert_eq!(FileFormat::from_path(Path::new("Cells.LIF")), Some(FileFormat::Lif));
        assert_eq!(FileFormat::from_path(Path::new("plate.Nd2")), Some(FileFormat::Nd2));
        assert_eq!(FileFormat::from_path(Path::new("image.tif")), None);
        assert_eq!(FileFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_unsupported_extension_is_extraction_error() {
        let path = PathBuf::from("notes.txt");
        let err = extract_file(&path).unwrap_err();
        assert_eq!(err.path, path);
        assert!(matches!(err.cause, ExtractionCause::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = extract_file("definitely/not/here.czi").unwrap_err();
        assert!(matches!(err.cause, ExtractionCause::Io(_)));
        assert!(err.to_string().contains("here.czi"));
    }

    #[test]
    fn test_extractor_for_reports_format() {
        for format in [FileFormat::Czi, FileFormat::Lif, FileFormat::Nd2] {
            assert_eq!(extractor_for(format).format(), format);
        }
    }
}

//! Error types crossing the extractor boundary.
//!
//! Exactly one error type leaves an extractor: [`MetadataExtractionError`].
//! It names the file and wraps an [`ExtractionCause`] describing why the
//! container or its embedded metadata could not be read. Missing or malformed
//! individual fields are never errors; they surface as
//! [`Field::Missing`](crate::schema::Field::Missing).

use std::path::{Path, PathBuf};

/// Why a container could not be opened or its metadata parsed.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionCause {
    /// I/O error opening or reading the container
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file extension does not name a supported vendor format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file is not a valid container of the claimed format
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// The container carries no usable metadata block
    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    /// The embedded XML metadata is malformed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Text in the metadata block is not valid UTF-8/UTF-16
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<quick_xml::events::attributes::AttrError> for ExtractionCause {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        ExtractionCause::Xml(quick_xml::Error::from(error))
    }
}

impl From<std::str::Utf8Error> for ExtractionCause {
    fn from(error: std::str::Utf8Error) -> Self {
        ExtractionCause::Encoding(error.to_string())
    }
}

impl From<std::string::FromUtf16Error> for ExtractionCause {
    fn from(error: std::string::FromUtf16Error) -> Self {
        ExtractionCause::Encoding(error.to_string())
    }
}

/// A metadata extraction failed for one file.
#[derive(Debug, thiserror::Error)]
#[error("Failed to extract metadata from {}: {cause}", .path.display())]
pub struct MetadataExtractionError {
    /// The file the extraction was attempted on
    pub path: PathBuf,

    /// The proximate cause
    #[source]
    pub cause: ExtractionCause,
}

impl MetadataExtractionError {
    /// Attach a file path to a cause.
    pub fn new(path: impl AsRef<Path>, cause: impl Into<ExtractionCause>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cause: cause.into(),
        }
    }
}

//! # ReMInD - Microscopy Acquisition Metadata Extraction
//!
//! `remind` reads the acquisition metadata embedded in proprietary microscopy
//! image files and normalizes it into one flat, ordered set of fields that
//! documentation tools can consume without knowing the vendor format.
//!
//! ## Supported Formats
//!
//! - **Zeiss CZI**: ZISRAW segment container with an embedded XML metadata
//!   segment.
//! - **Leica LIF**: container with a UTF-16 XML project header; one project
//!   may hold many images.
//! - **Nikon ND2**: chunked container whose metadata is stored as CLX binary
//!   descriptors (legacy JPEG 2000 files are not supported).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use remind::prelude::*;
//!
//! let extraction = extract_file("cells.czi")?;
//! for field in extraction.output.iter() {
//!     println!("{}: {}", field.name, field.value);
//! }
//!
//! // Flat text for documentation tools
//! let text = to_flat_text(&extraction.output);
//!
//! // Prefilled documentation form
//! let form = FormPrefill::from_extraction(&extraction);
//! println!("{}", form);
//! # Ok::<(), remind::error::MetadataExtractionError>(())
//! ```
//!
//! ## Architecture
//!
//! Every format goes through the same two stages:
//!
//! 1. A container reader locates the metadata block and decodes it into a
//!    [`tree::RawNode`] tree.
//! 2. An extractor reduces the tree to a [`schema::MetadataOutput`], whose
//!    field names and order come from [`schema::fields`].
//!
//! Missing information never fails an extraction; it is reported as
//! [`schema::Field::Missing`] and rendered as `N/A`. Only an unreadable
//! container or an absent metadata block is an error.

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod export;
pub mod form;
pub mod formats;
pub mod schema;
pub mod tree;
pub mod units;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::error::{ExtractionCause, MetadataExtractionError};
    pub use crate::export::{parse_flat_text, to_flat_text, ExportDocument, FLAT_TEXT_HEADER};
    pub use crate::form::{FormPrefill, FORM_LABELS};
    pub use crate::formats::czi::CziExtractor;
    pub use crate::formats::lif::LifExtractor;
    pub use crate::formats::nd2::Nd2Extractor;
    pub use crate::formats::{
        extract_file, extract_with_format, extractor_for, Extraction, FileFormat,
        MetadataExtractor,
    };
    pub use crate::schema::{Field, FieldValue, MetadataOutput, NormalizedField};
    pub use crate::tree::{RawMap, RawNode};
}

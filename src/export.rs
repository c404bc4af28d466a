//! Export of extracted metadata.
//!
//! Two renditions are supported:
//!
//! - flat text, one `key: value` line per field under a fixed header. This is
//!   the ReadMe-style format documentation tools have always consumed, and
//!   [`parse_flat_text`] reads it back. Lists are joined with `", "`, so a
//!   list whose entries contain commas does not survive a round trip.
//! - JSON, via [`ExportDocument`], which keeps lists as arrays and can carry
//!   the raw vendor tree.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::formats::{Extraction, FileFormat};
use crate::schema::{Field, MetadataOutput};
use crate::tree::RawNode;

/// First line of every flat text export.
pub const FLAT_TEXT_HEADER: &str = "# Extracted Image Metadata";

/// Render an output as flat `key: value` text.
///
/// Embedded newlines are escaped as `\n` so every field stays on one line.
pub fn to_flat_text(output: &MetadataOutput) -> String {
    let mut text = String::new();
    text.push_str(FLAT_TEXT_HEADER);
    text.push_str("\n\n");
    for field in output.iter() {
        let value = field.value.to_string().replace('\r', "").replace('\n', "\\n");
        text.push_str(&field.name);
        text.push_str(": ");
        text.push_str(&value);
        text.push('\n');
    }
    text
}

/// Parse flat text back into an output.
///
/// Blank lines and `#` comments are skipped, as are lines without a
/// `key: value` separator. `N/A` reads as missing. Numbers are inferred
/// only where they render back unchanged, so `007` stays text. Every value
/// comes back single-valued.
pub fn parse_flat_text(text: &str) -> MetadataOutput {
    let mut output = MetadataOutput::new();
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().replace("\\n", "\n");
        output.push(key, Field::from_rendered(&value));
    }
    output
}

/// A JSON export of one extraction.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    /// The file the metadata came from
    pub source: String,
    /// Vendor format
    pub format: FileFormat,
    /// When the export was produced
    pub exported_at: DateTime<Utc>,
    /// Normalized fields
    pub metadata: &'a MetadataOutput,
    /// The vendor-native tree, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<&'a RawNode>,
}

impl<'a> ExportDocument<'a> {
    /// Bundle an extraction for export, stamped with the current time.
    pub fn new(source: &Path, extraction: &'a Extraction, include_raw: bool) -> Self {
        Self {
            source: source.display().to_string(),
            format: extraction.format,
            exported_at: Utc::now(),
            metadata: &extraction.output,
            raw: include_raw.then_some(&extraction.raw),
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fields::*;
    use crate::tree::RawMap;

    fn sample() -> MetadataOutput {
        let mut output = MetadataOutput::new();
        output.push(DOCUMENT_NAME, Field::text("cells"));
        output.push(SIZE_X, Field::int(512));
        output.push(PIXEL_SIZE_X, Field::float(0.2));
        output.push(TIME_INTERVAL, Field::Missing);
        output.push(EXPERIMENT_DESCRIPTION, Field::text("line one\nline two"));
        output.push(CHANNEL_NAMES, vec![Field::text("DAPI"), Field::Missing]);
        output
    }

    #[test]
    fn test_flat_text_layout() {
        let text = to_flat_text(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], FLAT_TEXT_HEADER);
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Document Name: cells");
        assert_eq!(lines[3], "Size X: 512");
        assert_eq!(lines[4], "Pixel Size X (um): 0.2");
        assert_eq!(lines[5], "Time Interval (s): N/A");
        assert_eq!(lines[6], "Experiment Description: line one\\nline two");
        assert_eq!(lines[7], "Channel Names: DAPI, N/A");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_flat_text_round_trip() {
        let parsed = parse_flat_text(&to_flat_text(&sample()));

        assert_eq!(
            parsed.names().collect::<Vec<_>>(),
            sample().names().collect::<Vec<_>>()
        );
        assert_eq!(parsed.single(SIZE_X), Some(&Field::int(512)));
        assert_eq!(parsed.single(PIXEL_SIZE_X), Some(&Field::float(0.2)));
        assert_eq!(parsed.single(TIME_INTERVAL), Some(&Field::Missing));
        assert_eq!(
            parsed.single(EXPERIMENT_DESCRIPTION),
            Some(&Field::text("line one\nline two"))
        );
        // Lists come back as their joined text
        assert_eq!(parsed.single(CHANNEL_NAMES), Some(&Field::text("DAPI, N/A")));
    }

    #[test]
    fn test_flat_text_keeps_number_like_text() {
        let mut output = MetadataOutput::new();
        output.push(DOCUMENT_NAME, Field::text("007"));
        output.push(APPLICATION_VERSION, Field::text("2.30"));
        output.push(SIZE_X, Field::int(512));
        output.push(PIXEL_SIZE_X, Field::float(0.2));
        output.push(ZOOM, Field::float(60.0));

        let parsed = parse_flat_text(&to_flat_text(&output));

        assert_eq!(parsed.single(DOCUMENT_NAME), Some(&Field::text("007")));
        assert_eq!(parsed.single(APPLICATION_VERSION), Some(&Field::text("2.30")));
        assert_eq!(parsed.single(SIZE_X), Some(&Field::int(512)));
        assert_eq!(parsed.single(PIXEL_SIZE_X), Some(&Field::float(0.2)));
        assert_eq!(parsed.single(ZOOM), Some(&Field::float(60.0)));
        assert_eq!(parsed, output);
    }

    #[test]
    fn test_parse_skips_comments_and_noise() {
        let text = "# header\n\n  # indented comment\nno separator here\n: no key\nZoom: 2.5\nObjective Model: Plan: Apo\n";
        let parsed = parse_flat_text(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.single(ZOOM), Some(&Field::float(2.5)));
        assert_eq!(parsed.single(OBJECTIVE_MODEL), Some(&Field::text("Plan: Apo")));
    }

    #[test]
    fn test_export_document_json() {
        let mut raw = RawMap::new();
        raw.insert("ImageDocument", RawNode::text("x"));
        let extraction = Extraction {
            format: FileFormat::Czi,
            output: sample(),
            raw: RawNode::Map(raw),
        };

        let json = ExportDocument::new(Path::new("data/cells.czi"), &extraction, false)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "data/cells.czi");
        assert_eq!(value["format"], "CZI");
        assert_eq!(value["metadata"]["Size X"], 512);
        assert_eq!(value["metadata"]["Channel Names"][1], "N/A");
        assert!(value["exported_at"].is_string());
        assert!(value.get("raw").is_none());

        let json = ExportDocument::new(Path::new("data/cells.czi"), &extraction, true)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["raw"]["ImageDocument"], "x");
    }
}
